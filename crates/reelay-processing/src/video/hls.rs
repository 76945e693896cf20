//! HLS transcoder: ffmpeg rendition generation and publication.

use super::probe::VideoProbe;
use super::{select_ladder, HlsVariant, TranscodeError, TranscodeOutput, Transcoder};
use async_trait::async_trait;
use reelay_storage::Storage;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::process::Command;

const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";

/// Production [`Transcoder`]: shells out to ffmpeg/ffprobe, encodes the
/// rendition ladder into a scratch directory, then publishes the tree into
/// durable storage under `hls/{job_id}/`.
pub struct HlsTranscoder {
    ffmpeg_path: String,
    ffprobe_path: String,
    segment_duration: u64,
    requested_variants: Vec<String>,
    storage: Arc<dyn Storage>,
}

impl HlsTranscoder {
    pub fn new(
        ffmpeg_path: String,
        ffprobe_path: String,
        segment_duration: u64,
        requested_variants: Vec<String>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            segment_duration,
            requested_variants,
            storage,
        }
    }

    /// Encode one rendition into `{output_dir}/{name}/` as a vod playlist plus
    /// numbered segments.
    #[tracing::instrument(skip(ffmpeg_path, input_path, output_dir), fields(variant = %name))]
    #[allow(clippy::too_many_arguments)]
    async fn generate_variant(
        ffmpeg_path: String,
        input_path: std::path::PathBuf,
        output_dir: std::path::PathBuf,
        name: String,
        width: u32,
        height: u32,
        bitrate_kbps: u32,
        segment_duration: u64,
    ) -> Result<HlsVariant, TranscodeError> {
        let variant_dir = output_dir.join(&name);
        tokio::fs::create_dir_all(&variant_dir).await?;

        let playlist_path = variant_dir.join("index.m3u8");
        let segment_pattern = variant_dir.join("segment_%03d.ts");

        let mut args = vec![
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "fast".to_string(),
            "-profile:v".to_string(),
            "main".to_string(),
        ];

        args.extend_from_slice(&[
            "-vf".to_string(),
            format!("scale={}:{}", width, height),
            "-b:v".to_string(),
            format!("{}k", bitrate_kbps),
            "-maxrate".to_string(),
            format!("{}k", (bitrate_kbps as f32 * 1.2) as u32),
            "-bufsize".to_string(),
            format!("{}k", bitrate_kbps * 2),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            "-ar".to_string(),
            "48000".to_string(),
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            segment_duration.to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_segment_filename".to_string(),
            segment_pattern.to_string_lossy().to_string(),
            playlist_path.to_string_lossy().to_string(),
        ]);

        let output = Command::new(&ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscodeError::Encode(format!("Failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::Encode(format!("ffmpeg failed: {}", stderr)));
        }

        Ok(HlsVariant {
            resolution: format!("{}x{}", width, height),
            bitrate: bitrate_kbps,
            width,
            height,
            playlist_path: format!("{}/index.m3u8", name),
            name,
        })
    }

    /// Render the master playlist referencing variant playlists by relative path.
    fn create_master_playlist(variants: &[HlsVariant]) -> String {
        let mut playlist = String::from("#EXTM3U\n#EXT-X-VERSION:3\n\n");

        for variant in variants {
            playlist.push_str(&format!(
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}\n{}\n\n",
                variant.bitrate * 1000,
                variant.resolution,
                variant.playlist_path
            ));
        }

        playlist
    }

    /// Publish the encoded tree into durable storage under `hls/{job_id}/`.
    async fn publish_output(
        storage: &dyn Storage,
        output_dir: &Path,
        job_id: &str,
        variants: &[HlsVariant],
    ) -> Result<String, TranscodeError> {
        let base_key = format!("hls/{}", job_id);

        let master_key = format!("{}/master.m3u8", base_key);
        let master_content = tokio::fs::read(output_dir.join("master.m3u8")).await?;
        storage
            .upload(&master_key, PLAYLIST_CONTENT_TYPE, master_content)
            .await?;

        for variant in variants {
            let variant_dir = output_dir.join(&variant.name);

            let playlist_content = tokio::fs::read(variant_dir.join("index.m3u8")).await?;
            let playlist_key = format!("{}/{}/index.m3u8", base_key, variant.name);
            storage
                .upload(&playlist_key, PLAYLIST_CONTENT_TYPE, playlist_content)
                .await?;

            let mut entries = tokio::fs::read_dir(&variant_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                    let segment_name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(String::from)
                        .ok_or_else(|| {
                            TranscodeError::Encode("Invalid segment path: missing file name".into())
                        })?;
                    let segment_content = tokio::fs::read(&path).await?;
                    let segment_key = format!("{}/{}/{}", base_key, variant.name, segment_name);
                    storage
                        .upload(&segment_key, SEGMENT_CONTENT_TYPE, segment_content)
                        .await?;
                }
            }

            tracing::info!(job_id = %job_id, variant = %variant.name, "Variant published");
        }

        Ok(master_key)
    }
}

#[async_trait]
impl Transcoder for HlsTranscoder {
    #[tracing::instrument(skip(self, source), fields(job_id = %job_id))]
    async fn transcode(
        &self,
        source: &Path,
        job_id: &str,
    ) -> Result<TranscodeOutput, TranscodeError> {
        let probe = VideoProbe::new(self.ffprobe_path.clone());
        let metadata = probe.probe(source).await?;

        tracing::info!(
            job_id = %job_id,
            width = metadata.width,
            height = metadata.height,
            duration = ?metadata.duration,
            "Source probed, generating HLS variants"
        );

        let ladder = select_ladder(&self.requested_variants, metadata.height);
        if ladder.is_empty() {
            return Err(TranscodeError::Encode(
                "No usable variants configured".to_string(),
            ));
        }

        let temp_dir = TempDir::new()?;
        let output_dir = temp_dir.path().to_path_buf();

        let mut tasks = Vec::new();
        for (name, width, height, bitrate) in ladder {
            tasks.push(tokio::spawn(Self::generate_variant(
                self.ffmpeg_path.clone(),
                source.to_path_buf(),
                output_dir.clone(),
                name.to_string(),
                width,
                height,
                bitrate,
                self.segment_duration,
            )));
        }

        let mut variants = Vec::new();
        for task in tasks {
            match task.await {
                Ok(Ok(variant)) => variants.push(variant),
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(TranscodeError::Encode(format!("Encode task failed: {}", e))),
            }
        }

        if variants.is_empty() {
            return Err(TranscodeError::Encode(
                "No variants were generated".to_string(),
            ));
        }

        let master = Self::create_master_playlist(&variants);
        tokio::fs::write(output_dir.join("master.m3u8"), master).await?;

        let master_playlist_key =
            Self::publish_output(self.storage.as_ref(), &output_dir, job_id, &variants).await?;

        tracing::info!(
            job_id = %job_id,
            variant_count = variants.len(),
            master = %master_playlist_key,
            "HLS rendition set published"
        );

        Ok(TranscodeOutput {
            master_playlist_key,
            variants,
        })
    }
}
