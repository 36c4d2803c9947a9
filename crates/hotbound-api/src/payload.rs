//! Turns profile screenshots into the JPEG payloads the analysis endpoint expects.

use hotbound_core::{ApiError, ImagePayload};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::Path;

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Load an image file and re-encode it as JPEG. The format is sniffed from the
/// content, not the extension.
pub fn jpeg_from_path(path: &Path, quality: u8) -> Result<ImagePayload, ApiError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ApiError::Encoding(format!("failed to open {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded screenshot");
    jpeg_from_bytes(&bytes, quality)
}

/// Decode an in-memory image and re-encode it as JPEG.
pub fn jpeg_from_bytes(bytes: &[u8], quality: u8) -> Result<ImagePayload, ApiError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ApiError::Encoding(format!("failed to decode image: {e}")))?;
    tracing::debug!(width = image.width(), height = image.height(), "decoded screenshot");
    encode_jpeg(&image, quality)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<ImagePayload, ApiError> {
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| ApiError::Encoding(format!("failed to encode JPEG: {e}")))?;
    Ok(ImagePayload::new(jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(8, 8, Rgba([10, 120, 200, 128]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_png_is_reencoded_as_jpeg() {
        let payload = jpeg_from_bytes(&png_bytes(), DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&payload.jpeg[..2], &[0xff, 0xd8]);
        let decoded = image::load_from_memory(&payload.jpeg).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let result = jpeg_from_bytes(b"definitely not an image", DEFAULT_JPEG_QUALITY);
        assert!(matches!(result, Err(ApiError::Encoding(_))));
    }

    #[test]
    fn test_jpeg_from_path_reads_file() {
        let dir = std::env::temp_dir().join("hotbound_payload_path");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("profile.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let payload = jpeg_from_path(&path, 50).unwrap();
        assert_eq!(&payload.jpeg[..2], &[0xff, 0xd8]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_jpeg_from_path_ignores_misleading_extension() {
        let dir = std::env::temp_dir().join("hotbound_payload_sniff");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("screenshot.jpg");
        std::fs::write(&path, png_bytes()).unwrap();

        let payload = jpeg_from_path(&path, DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&payload.jpeg[..2], &[0xff, 0xd8]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_jpeg_from_missing_path_fails() {
        let path = std::env::temp_dir().join("hotbound_payload_missing.png");
        let _ = std::fs::remove_file(&path);
        let result = jpeg_from_path(&path, DEFAULT_JPEG_QUALITY);
        match result {
            Err(ApiError::Encoding(msg)) => assert!(msg.contains("hotbound_payload_missing")),
            other => panic!("expected Encoding error, got {other:?}"),
        }
    }
}
