use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Kind of a published media asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Normalized still image.
    Image,
    /// Raw video file served via byte-range requests.
    Video,
    /// Adaptive-bitrate HLS rendition set.
    Hls,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Hls => write!(f, "hls"),
        }
    }
}

/// A single published asset, as returned by the upload endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MediaAssetResponse {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

/// Response for an HLS transcode submission. `url` points to the eventual
/// master playlist and becomes valid once the job reaches `success`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HlsUploadResponse {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MediaKind::Image).unwrap(),
            "\"image\""
        );
        assert_eq!(serde_json::to_string(&MediaKind::Hls).unwrap(), "\"hls\"");
    }

    #[test]
    fn asset_response_uses_type_field() {
        let response = MediaAssetResponse {
            url: "http://localhost:4000/media/images/a.jpg".to_string(),
            kind: MediaKind::Image,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("image"));
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn hls_response_carries_job_id() {
        let response = HlsUploadResponse {
            url: "http://localhost:4000/media/hls/abc/master.m3u8".to_string(),
            kind: MediaKind::Hls,
            job_id: "abc".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json.get("job_id").and_then(|v| v.as_str()), Some("abc"));
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("hls"));
    }
}
