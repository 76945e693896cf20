//! Image normalizer: bounded fit-inside resize and JPEG re-encode.

use bytes::Bytes;
use image::imageops::FilterType;
use image::GenericImageView;
use std::io::Cursor;
use std::path::Path;

/// Errors from image normalization. Malformed image data does not become valid
/// on retry, so none of these are recoverable.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to read staged image: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalizes uploaded images into a bounded, web-safe form: neither dimension
/// exceeds `max_dimension` (aspect ratio preserved, never upscaled) and the
/// output is always baseline JPEG at a fixed quality.
#[derive(Clone, Copy, Debug)]
pub struct ImageNormalizer {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImageNormalizer {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            max_dimension,
            jpeg_quality,
        }
    }

    /// Normalize a staged image file. Decode and encode are CPU-bound, so the
    /// work runs off the async pool.
    pub async fn normalize_file(&self, path: &Path) -> Result<Bytes, NormalizeError> {
        let data = tokio::fs::read(path).await?;
        let normalizer = *self;
        tokio::task::spawn_blocking(move || normalizer.normalize(&data))
            .await
            .map_err(|e| NormalizeError::Decode(format!("normalize task panicked: {}", e)))?
    }

    /// Normalize in-memory image bytes.
    pub fn normalize(&self, data: &[u8]) -> Result<Bytes, NormalizeError> {
        let img = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| NormalizeError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| NormalizeError::Decode(e.to_string()))?;

        let (width, height) = img.dimensions();

        let img = if width > self.max_dimension || height > self.max_dimension {
            let filter = select_filter(width.max(height), self.max_dimension);
            img.resize(self.max_dimension, self.max_dimension, filter)
        } else {
            img
        };

        // JPEG has no alpha channel; flatten before encoding.
        let rgb = img.to_rgb8();
        let mut buffer = Vec::with_capacity((rgb.width() * rgb.height() / 2) as usize);
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| NormalizeError::Encode(e.to_string()))?;

        tracing::debug!(
            source_width = width,
            source_height = height,
            output_width = rgb.width(),
            output_height = rgb.height(),
            output_bytes = buffer.len(),
            "Image normalized"
        );

        Ok(Bytes::from(buffer))
    }
}

/// Pick a resampling filter by downscale ratio: cheap filters for heavy
/// reductions, Lanczos when the sizes are close.
fn select_filter(source_extent: u32, target_extent: u32) -> FilterType {
    let ratio = source_extent as f32 / target_extent as f32;
    if ratio > 2.0 {
        FilterType::Triangle
    } else if ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([120, 80, 40, 255]),
        ));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
        image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
            .dimensions()
    }

    #[test]
    fn oversized_image_is_bounded() {
        let normalizer = ImageNormalizer::new(1200, 80);
        let out = normalizer.normalize(&png_bytes(2400, 1200)).unwrap();
        let (w, h) = decoded_dimensions(&out);
        assert!(w <= 1200 && h <= 1200);
        // Aspect ratio 2:1 is preserved.
        assert_eq!(w, 1200);
        assert_eq!(h, 600);
    }

    #[test]
    fn small_image_is_never_upscaled() {
        let normalizer = ImageNormalizer::new(1200, 80);
        let out = normalizer.normalize(&png_bytes(320, 240)).unwrap();
        assert_eq!(decoded_dimensions(&out), (320, 240));
    }

    #[test]
    fn exact_bound_is_left_alone() {
        let normalizer = ImageNormalizer::new(1200, 80);
        let out = normalizer.normalize(&png_bytes(1200, 1200)).unwrap();
        assert_eq!(decoded_dimensions(&out), (1200, 1200));
    }

    #[test]
    fn tall_image_bounds_height() {
        let normalizer = ImageNormalizer::new(1200, 80);
        let out = normalizer.normalize(&png_bytes(600, 2400)).unwrap();
        assert_eq!(decoded_dimensions(&out), (300, 1200));
    }

    #[test]
    fn output_is_jpeg() {
        let normalizer = ImageNormalizer::new(1200, 80);
        let out = normalizer.normalize(&png_bytes(64, 64)).unwrap();
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn garbage_input_fails_to_decode() {
        let normalizer = ImageNormalizer::new(1200, 80);
        let err = normalizer.normalize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));
    }

    #[test]
    fn filter_selection_by_ratio() {
        assert_eq!(select_filter(4000, 1200), FilterType::Triangle);
        assert_eq!(select_filter(2000, 1200), FilterType::CatmullRom);
        assert_eq!(select_filter(1300, 1200), FilterType::Lanczos3);
    }
}
