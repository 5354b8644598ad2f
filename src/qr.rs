// File: qr.rs
// Location: /src/qr.rs

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use qrcode::Color;
use qrcode::QrCode;

use crate::config::{EcLevel, QrConfig};

/// Produces the bare QR pixel surface (no quiet zone) for a configuration.
///
/// The returned image may be narrower than `config.size`: implementations
/// are free to round to whole pixels per module.
pub trait MatrixRenderer {
    fn render(&self, config: &QrConfig) -> Result<RgbaImage>;
}

/// Renderer backed by the `qrcode` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeRenderer;

impl MatrixRenderer for QrCodeRenderer {
    fn render(&self, config: &QrConfig) -> Result<RgbaImage> {
        let fg = resolve_color(&config.fg_color, FALLBACK_FG);
        let bg = resolve_color(&config.bg_color, FALLBACK_BG);
        render_matrix(&config.text, config.size, fg, bg, config.level)
    }
}

pub fn render_matrix(
    data: &str,
    size: u32,
    fg: Rgba<u8>,
    bg: Rgba<u8>,
    level: EcLevel,
) -> Result<RgbaImage> {
    let code = QrCode::with_error_correction_level(data, level.into())
        .with_context(|| format!("Failed to encode {} bytes at level {:?}", data.len(), level))?;
    let modules = code.width() as u32;
    let scale = (size / modules).max(1);
    let img_size = modules * scale;

    let mut img = ImageBuffer::from_pixel(img_size, img_size, bg);

    for y in 0..modules {
        for x in 0..modules {
            if code[(x as usize, y as usize)] == Color::Dark {
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(x * scale + dx, y * scale + dy, fg);
                    }
                }
            }
        }
    }

    log::debug!(
        "Rendered {}x{} modules at {} px/module ({} px, requested {})",
        modules,
        modules,
        scale,
        img_size,
        size
    );

    Ok(img)
}

/// Colors used in place of strings that do not parse.
pub const FALLBACK_FG: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const FALLBACK_BG: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Like [`parse_color`], but an unparsable value draws with `fallback`
/// instead of failing the render.
pub fn resolve_color(value: &str, fallback: Rgba<u8>) -> Rgba<u8> {
    match parse_color(value) {
        Ok(color) => color,
        Err(e) => {
            log::warn!("{}, drawing with {:?} instead", e, fallback.0);
            fallback
        }
    }
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
pub fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Not a hex color: {:?}", value);
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);

    let rgba = match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (slot, c) in out.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16).unwrap_or(0) as u8;
                *slot = v * 17;
            }
            out
        }
        6 => [channel(0)?, channel(2)?, channel(4)?, 255],
        8 => [channel(0)?, channel(2)?, channel(4)?, channel(6)?],
        _ => anyhow::bail!("Not a hex color: {:?}", value),
    };

    Ok(Rgba(rgba))
}
