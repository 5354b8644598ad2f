// File: export.rs
// Location: /src/export.rs

use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "qrcode.png";

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .context("Failed to encode PNG")?;
    Ok(bytes)
}

/// Writes the image to `path`. A directory gets `qrcode.png` appended.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<PathBuf> {
    let target = if path.is_dir() {
        path.join(EXPORT_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let bytes = encode_png(image)?;
    std::fs::write(&target, bytes)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    log::info!("Saved QR code to {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(30, 30, |x, y| Rgba([x as u8 * 8, y as u8 * 8, 77, 255]))
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&sample()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_save_into_directory_uses_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let saved = save_png(&sample(), dir.path()).unwrap();
        assert_eq!(saved, dir.path().join("qrcode.png"));
        assert!(saved.exists());
    }

    #[test]
    fn test_save_to_explicit_path_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out/code.png");
        let saved = save_png(&sample(), &target).unwrap();
        assert_eq!(saved, target);
        assert_eq!(image::open(&saved).unwrap().width(), 30);
    }
}
