//! Video metadata extraction via ffprobe.

use super::TranscodeError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Metadata of the first video stream of a source file.
#[derive(Debug, Clone, Copy)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub duration: Option<f64>,
}

pub struct VideoProbe {
    ffprobe_path: String,
}

impl VideoProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    #[tracing::instrument(skip(self, video_path), fields(ffmpeg.operation = "probe"))]
    pub async fn probe(&self, video_path: &Path) -> Result<VideoMetadata, TranscodeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(video_path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| TranscodeError::Probe(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(TranscodeError::Probe(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let probe_data: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| TranscodeError::Probe(format!("Failed to parse ffprobe output: {}", e)))?;

        parse_probe_output(&probe_data)
    }
}

fn parse_probe_output(probe_data: &serde_json::Value) -> Result<VideoMetadata, TranscodeError> {
    let stream = probe_data["streams"]
        .get(0)
        .ok_or_else(|| TranscodeError::Probe("No video stream found".to_string()))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| TranscodeError::Probe("Could not parse width".to_string()))?
        as u32;

    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| TranscodeError::Probe("Could not parse height".to_string()))?
        as u32;

    let duration = probe_data["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok());

    Ok(VideoMetadata {
        width,
        height,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_dimensions_and_duration() {
        let data = json!({
            "streams": [{"width": 1920, "height": 1080, "codec_name": "h264"}],
            "format": {"duration": "12.480000"}
        });
        let meta = parse_probe_output(&data).unwrap();
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert!((meta.duration.unwrap() - 12.48).abs() < 1e-9);
    }

    #[test]
    fn missing_duration_is_tolerated() {
        let data = json!({
            "streams": [{"width": 640, "height": 360}],
            "format": {}
        });
        let meta = parse_probe_output(&data).unwrap();
        assert_eq!(meta.height, 360);
        assert!(meta.duration.is_none());
    }

    #[test]
    fn no_video_stream_is_an_error() {
        let data = json!({"streams": [], "format": {}});
        let err = parse_probe_output(&data).unwrap_err();
        assert!(matches!(err, TranscodeError::Probe(_)));
    }

    #[test]
    fn missing_dimensions_is_an_error() {
        let data = json!({
            "streams": [{"codec_name": "h264"}],
            "format": {"duration": "1.0"}
        });
        assert!(parse_probe_output(&data).is_err());
    }
}
