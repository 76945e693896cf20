//! Multipart intake: parse form parts, enforce the upload policy, and stage
//! accepted files on scratch storage.
//!
//! Parsing returns a structured result rather than reporting errors through
//! callbacks or exceptions: either every part was accepted and staged, or a
//! typed validation failure is returned and nothing is left on disk. All
//! validation happens against in-memory buffers before the first scratch
//! write, so a rejected part can never leave a partial file behind.

use axum::extract::Multipart;
use reelay_processing::intake::extension_of;
use reelay_processing::{Scratch, StagedFile, UploadPolicy, UploadValidationError};

use crate::error::HttpAppError;

/// One accepted part, buffered and validated but not yet staged.
pub struct ExtractedFile {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: String,
}

/// Read and validate every part of the multipart body.
pub async fn extract_files(
    mut multipart: Multipart,
    policy: &UploadPolicy,
) -> Result<Vec<ExtractedFile>, UploadValidationError> {
    let mut files = Vec::new();
    let mut total_size = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadValidationError::Malformed(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        policy.check_field_name(&field_name)?;

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        policy.check_content_type(&content_type)?;

        policy.check_file_count(files.len() + 1)?;

        let file_name = field.file_name().map(|s| s.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| UploadValidationError::Malformed(e.to_string()))?
            .to_vec();

        policy.check_file_size(data.len())?;
        total_size += data.len();
        policy.check_total_size(total_size)?;

        files.push(ExtractedFile {
            data,
            file_name,
            content_type,
        });
    }

    if files.is_empty() {
        return Err(UploadValidationError::EmptyUpload);
    }

    Ok(files)
}

/// Parse, validate, and stage an upload request.
///
/// Returns the staged files in part order. If staging fails midway, files
/// already staged by this request are removed before the error is returned.
pub async fn receive_upload(
    scratch: &Scratch,
    policy: &UploadPolicy,
    multipart: Multipart,
) -> Result<Vec<StagedFile>, HttpAppError> {
    let files = extract_files(multipart, policy).await?;

    let mut staged: Vec<StagedFile> = Vec::with_capacity(files.len());
    for file in files {
        let extension = extension_for(&file);
        match scratch
            .stage(policy.kind, &extension, &file.content_type, file.data)
            .await
        {
            Ok(s) => staged.push(s),
            Err(e) => {
                tracing::error!(error = %e, "Failed to stage upload, discarding request");
                discard_all(staged).await;
                return Err(reelay_core::AppError::Internal(format!(
                    "Failed to stage upload: {}",
                    e
                ))
                .into());
            }
        }
    }

    Ok(staged)
}

/// Remove a batch of staged files (error cleanup path).
pub async fn discard_all(staged: Vec<StagedFile>) {
    for file in staged {
        file.discard().await;
    }
}

/// File extension for the staged copy: from the uploaded filename when
/// present, otherwise from the MIME subtype.
fn extension_for(file: &ExtractedFile) -> String {
    if let Some(ext) = file.file_name.as_deref().and_then(extension_of) {
        return ext;
    }
    file.content_type
        .split('/')
        .nth(1)
        .unwrap_or("bin")
        .split(';')
        .next()
        .unwrap_or("bin")
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(file_name: Option<&str>, content_type: &str) -> ExtractedFile {
        ExtractedFile {
            data: vec![],
            file_name: file_name.map(String::from),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn extension_prefers_filename() {
        let file = extracted(Some("holiday.MOV"), "video/mp4");
        assert_eq!(extension_for(&file), "mov");
    }

    #[test]
    fn extension_falls_back_to_mime_subtype() {
        let file = extracted(None, "video/mp4");
        assert_eq!(extension_for(&file), "mp4");

        let file = extracted(Some("noext"), "image/png");
        assert_eq!(extension_for(&file), "png");
    }

    #[test]
    fn extension_strips_mime_parameters() {
        let file = extracted(None, "video/mp4; codecs=avc1");
        assert_eq!(extension_for(&file), "mp4");
    }
}
