//! Video transcoding: ffmpeg-backed HLS rendition generation.

mod hls;
mod probe;

pub use hls::HlsTranscoder;
pub use probe::{VideoMetadata, VideoProbe};

use async_trait::async_trait;
use reelay_storage::StorageError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from the transcode pipeline. Recorded on the encode job as a
/// diagnostic; never surfaced to the HTTP caller that triggered the enqueue.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Encode failed: {0}")]
    Encode(String),

    #[error("Failed to publish HLS output: {0}")]
    Publish(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One bitrate/resolution rendition of a transcoded video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HlsVariant {
    pub name: String,
    pub resolution: String,
    pub bitrate: u32,
    pub width: u32,
    pub height: u32,
    /// Playlist URI relative to the master playlist.
    pub playlist_path: String,
}

/// Result of a successful transcode.
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    /// Storage key of the master playlist (`hls/{job_id}/master.m3u8`).
    pub master_playlist_key: String,
    pub variants: Vec<HlsVariant>,
}

/// Converts one staged video into a published HLS rendition set rooted at the
/// job's output directory.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, source: &Path, job_id: &str)
        -> Result<TranscodeOutput, TranscodeError>;
}

/// Fixed rendition ladder: (name, width, height, video bitrate kbps).
pub(crate) const VARIANT_LADDER: [(&str, u32, u32, u32); 4] = [
    ("360p", 640, 360, 800),
    ("480p", 854, 480, 1400),
    ("720p", 1280, 720, 2800),
    ("1080p", 1920, 1080, 5000),
];

/// Pick the rungs to encode: requested variants whose height does not exceed
/// the source. A source smaller than every requested rung still gets the
/// smallest requested one, so low-resolution uploads remain streamable.
pub(crate) fn select_ladder(
    requested: &[String],
    source_height: u32,
) -> Vec<(&'static str, u32, u32, u32)> {
    let requested_rungs: Vec<_> = VARIANT_LADDER
        .iter()
        .copied()
        .filter(|(name, _, _, _)| requested.iter().any(|r| r == name))
        .collect();

    let fitting: Vec<_> = requested_rungs
        .iter()
        .copied()
        .filter(|(_, _, height, _)| source_height >= *height)
        .collect();

    if !fitting.is_empty() {
        fitting
    } else {
        requested_rungs.into_iter().take(1).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<String> {
        VARIANT_LADDER
            .iter()
            .map(|(name, _, _, _)| name.to_string())
            .collect()
    }

    #[test]
    fn ladder_excludes_rungs_above_source() {
        let selected = select_ladder(&all_variants(), 720);
        let names: Vec<_> = selected.iter().map(|(n, _, _, _)| *n).collect();
        assert_eq!(names, vec!["360p", "480p", "720p"]);
    }

    #[test]
    fn full_ladder_for_1080_source() {
        let selected = select_ladder(&all_variants(), 1080);
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn tiny_source_still_gets_smallest_rung() {
        let selected = select_ladder(&all_variants(), 240);
        let names: Vec<_> = selected.iter().map(|(n, _, _, _)| *n).collect();
        assert_eq!(names, vec!["360p"]);
    }

    #[test]
    fn only_requested_variants_are_considered() {
        let requested = vec!["720p".to_string()];
        let selected = select_ladder(&requested, 1080);
        let names: Vec<_> = selected.iter().map(|(n, _, _, _)| *n).collect();
        assert_eq!(names, vec!["720p"]);
    }

    #[test]
    fn unknown_variant_names_are_ignored() {
        let requested = vec!["4320p".to_string(), "480p".to_string()];
        let selected = select_ladder(&requested, 1080);
        let names: Vec<_> = selected.iter().map(|(n, _, _, _)| *n).collect();
        assert_eq!(names, vec!["480p"]);
    }
}
