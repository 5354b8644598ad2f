// File: logo.rs
// Location: /src/logo.rs

use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Why a logo could not be placed. Never fatal: the code is still
/// produced without the logo.
#[derive(Debug, thiserror::Error)]
pub enum LogoError {
    #[error("Failed to read logo {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode logo: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Logo cannot be drawn: {0}")]
    Geometry(String),
    #[error("Logo loading was interrupted")]
    Cancelled,
}

pub fn decode_logo(bytes: &[u8]) -> Result<RgbaImage, LogoError> {
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(LogoError::Geometry("logo has no pixels".to_string()));
    }
    Ok(image.to_rgba8())
}

/// Reads and decodes a logo file off the UI thread.
pub async fn load_logo(path: impl AsRef<Path>) -> Result<RgbaImage, LogoError> {
    let path = path.as_ref().to_path_buf();
    let bytes = tokio::fs::read(&path).await.map_err(|source| LogoError::Io {
        path: path.clone(),
        source,
    })?;

    log::debug!("Decoding logo {:?} ({} bytes)", path, bytes.len());

    tokio::task::spawn_blocking(move || decode_logo(&bytes))
        .await
        .map_err(|_| LogoError::Cancelled)?
}
