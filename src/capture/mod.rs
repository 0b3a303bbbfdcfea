//! Screenshot capture domain — public API.
//!
//! This module owns getting a complaint screenshot into memory: from an
//! image file, or pasted from the system clipboard.

use image::{DynamicImage, RgbaImage};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("无法读取图片 {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("剪贴板中没有图片: {0}")]
    Clipboard(String),
    #[error("剪贴板图片尺寸与数据不符 ({width}x{height})")]
    Malformed { width: usize, height: usize },
    #[error("PNG 编码失败: {0}")]
    Encode(String),
}

/// Decode an image file (PNG, JPEG, ...).
pub fn load_from_path(path: &Path) -> Result<DynamicImage, CaptureError> {
    let image = image::open(path).map_err(|e| CaptureError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    log::info!(
        "[CAPTURE] Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Read the image currently on the system clipboard.
pub fn paste_from_clipboard() -> Result<DynamicImage, CaptureError> {
    let start = std::time::Instant::now();
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| CaptureError::Clipboard(e.to_string()))?;
    let data = clipboard
        .get_image()
        .map_err(|e| CaptureError::Clipboard(e.to_string()))?;
    let image = from_rgba(data.width, data.height, data.bytes.into_owned())?;
    log::info!(
        "[CAPTURE] Pasted {}x{} image in {}ms",
        image.width(),
        image.height(),
        start.elapsed().as_millis()
    );
    Ok(image)
}

/// Build an image from raw RGBA8 pixels.
pub fn from_rgba(width: usize, height: usize, bytes: Vec<u8>) -> Result<DynamicImage, CaptureError> {
    let malformed = || CaptureError::Malformed { width, height };
    let w = u32::try_from(width).map_err(|_| malformed())?;
    let h = u32::try_from(height).map_err(|_| malformed())?;
    RgbaImage::from_raw(w, h, bytes)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(malformed)
}

/// Encode to PNG bytes in memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CaptureError> {
    let mut png_bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_with_wrong_length_is_malformed() {
        let err = from_rgba(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(err, CaptureError::Malformed { width: 2, height: 2 }));
    }

    #[test]
    fn rgba_builds_image_of_given_size() {
        let image = from_rgba(3, 2, vec![255; 3 * 2 * 4]).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
    }

    #[test]
    fn encoded_png_has_signature() {
        let png = encode_png(&DynamicImage::new_rgba8(2, 2)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_from_path(Path::new("/no/such/screenshot.png")).unwrap_err();
        assert!(matches!(err, CaptureError::Load { .. }));
    }

    #[test]
    fn saved_png_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, encode_png(&DynamicImage::new_rgba8(5, 7)).unwrap()).unwrap();
        let image = load_from_path(&path).unwrap();
        assert_eq!((image.width(), image.height()), (5, 7));
    }
}
