//! Corgi photo ingestion.
//!
//! Uploaded photos are decoded, cropped to cover a square canvas, re-encoded
//! as WebP and returned as an inline data URI. Nothing is written to disk.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Output width and height in pixels.
pub const CANVAS_SIZE: u32 = 512;

const DATA_URI_PREFIX: &str = "data:image/webp;base64,";

/// Errors from image ingestion.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The upload was empty.
    #[error("no image data")]
    Empty,

    /// The upload is not a supported image.
    #[error("unsupported or corrupt image: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding failed.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// The blocking task panicked or was cancelled.
    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Normalize an uploaded photo into a 512x512 WebP data URI.
///
/// CPU-bound; prefer [`ingest`] from async code.
///
/// # Errors
///
/// Returns `ImageError::Decode` for anything that isn't a JPEG, PNG, GIF or
/// WebP image.
pub fn to_data_uri(bytes: &[u8]) -> Result<String, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    let decoded = image::load_from_memory(bytes).map_err(ImageError::Decode)?;
    let square = decoded.resize_to_fill(CANVAS_SIZE, CANVAS_SIZE, FilterType::Lanczos3);

    // The WebP encoder only accepts 8-bit RGB(A).
    let rgba = DynamicImage::ImageRgba8(square.to_rgba8());
    let mut webp = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut webp), ImageFormat::WebP)
        .map_err(ImageError::Encode)?;

    let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + webp.len() * 4 / 3 + 4);
    uri.push_str(DATA_URI_PREFIX);
    STANDARD.encode_string(&webp, &mut uri);
    Ok(uri)
}

/// Run [`to_data_uri`] on the blocking thread pool.
///
/// # Errors
///
/// Same as [`to_data_uri`], plus `ImageError::Task` if the worker fails.
#[tracing::instrument(skip(bytes), fields(bytes = bytes.len()))]
pub async fn ingest(bytes: Vec<u8>) -> Result<String, ImageError> {
    let uri = tokio::task::spawn_blocking(move || to_data_uri(&bytes)).await??;
    tracing::debug!(uri_len = uri.len(), "Image ingested");
    Ok(uri)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
            .unwrap();
        out
    }

    fn decode_uri(uri: &str) -> DynamicImage {
        let payload = uri.strip_prefix(DATA_URI_PREFIX).unwrap();
        let bytes = STANDARD.decode(payload).unwrap();
        image::load_from_memory_with_format(&bytes, ImageFormat::WebP).unwrap()
    }

    #[test]
    fn test_landscape_jpeg_becomes_square_webp() {
        let uri = to_data_uri(&jpeg(1024, 768)).unwrap();
        assert!(uri.starts_with("data:image/webp;base64,"));
        assert_eq!(decode_uri(&uri).dimensions(), (512, 512));
    }

    #[test]
    fn test_small_image_is_upscaled() {
        let uri = to_data_uri(&jpeg(64, 200)).unwrap();
        assert_eq!(decode_uri(&uri).dimensions(), (512, 512));
    }

    #[test]
    fn test_non_image_is_rejected() {
        let err = to_data_uri(b"%PDF-1.7 definitely not a corgi").unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(to_data_uri(&[]), Err(ImageError::Empty)));
    }

    #[tokio::test]
    async fn test_ingest_runs_on_blocking_pool() {
        let uri = ingest(jpeg(300, 300)).await.unwrap();
        assert_eq!(decode_uri(&uri).dimensions(), (512, 512));
    }
}
