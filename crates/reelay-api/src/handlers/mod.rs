pub mod health;
pub mod hls_stream;
pub mod hls_upload;
pub mod image_get;
pub mod image_upload;
pub mod job_status;
pub mod video_stream;
pub mod video_upload;

/// Content type for a served file, derived from its extension.
pub(crate) fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "ts" | "m2ts" => "video/mp2t",
        "m3u8" => "application/vnd.apple.mpegurl",
        _ => "application/octet-stream",
    }
}

/// Reject path components that could escape the storage namespace.
pub(crate) fn is_safe_path_component(component: &str) -> bool {
    !component.is_empty()
        && !component.contains("..")
        && !component.contains('/')
        && !component.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for_extension("jpg"), "image/jpeg");
        assert_eq!(content_type_for_extension("MP4"), "video/mp4");
        assert_eq!(content_type_for_extension("m3u8"), "application/vnd.apple.mpegurl");
        assert_eq!(content_type_for_extension("ts"), "video/mp2t");
        assert_eq!(content_type_for_extension("exe"), "application/octet-stream");
    }

    #[test]
    fn path_component_safety() {
        assert!(is_safe_path_component("segment_000.ts"));
        assert!(is_safe_path_component("720p"));
        assert!(!is_safe_path_component(""));
        assert!(!is_safe_path_component("../secret"));
        assert!(!is_safe_path_component("a/b"));
        assert!(!is_safe_path_component("a\\b"));
    }
}
