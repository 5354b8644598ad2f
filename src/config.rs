// File: config.rs
// Location: /src/config.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TEXT: &str = "https://example.com";
pub const DEFAULT_FG_COLOR: &str = "#000000";
pub const DEFAULT_BG_COLOR: &str = "#ffffff";

pub const MIN_SIZE: u32 = 128;
pub const MAX_SIZE: u32 = 512;
pub const SIZE_STEP: u32 = 32;
pub const DEFAULT_SIZE: u32 = 256;

pub const MIN_LOGO_SIZE: u32 = 20;
pub const MAX_LOGO_SIZE: u32 = 100;
pub const DEFAULT_LOGO_SIZE: u32 = 50;

/// Error correction level, ordered by increasing redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum EcLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl EcLevel {
    pub const ALL: [EcLevel; 4] = [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H];

    pub fn label(self) -> &'static str {
        match self {
            EcLevel::L => "Low (7%)",
            EcLevel::M => "Medium (15%)",
            EcLevel::Q => "Quartile (25%)",
            EcLevel::H => "High (30%)",
        }
    }
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoShape {
    Square,
    Circle,
    #[default]
    Rounded,
}

impl LogoShape {
    pub const ALL: [LogoShape; 3] = [LogoShape::Square, LogoShape::Circle, LogoShape::Rounded];

    pub fn label(self) -> &'static str {
        match self {
            LogoShape::Square => "Square",
            LogoShape::Circle => "Circle",
            LogoShape::Rounded => "Rounded",
        }
    }
}

impl fmt::Display for LogoShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rendering parameters for one QR code.
///
/// Colors are kept as the user typed them; they are only parsed when the
/// code is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrConfig {
    pub text: String,
    pub size: u32,
    pub fg_color: String,
    pub bg_color: String,
    #[serde(default)]
    pub level: EcLevel,
    #[serde(default = "default_logo_size")]
    pub logo_size: u32,
    #[serde(default = "default_logo_opacity")]
    pub logo_opacity: f32,
    #[serde(default)]
    pub logo_shape: LogoShape,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            size: DEFAULT_SIZE,
            fg_color: DEFAULT_FG_COLOR.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            level: EcLevel::default(),
            logo_size: DEFAULT_LOGO_SIZE,
            logo_opacity: default_logo_opacity(),
            logo_shape: LogoShape::default(),
        }
    }
}

fn default_logo_size() -> u32 {
    DEFAULT_LOGO_SIZE
}

fn default_logo_opacity() -> f32 {
    1.0
}

/// Snaps a requested size onto the 128..=512 grid with step 32.
pub fn quantize_size(size: u32) -> u32 {
    let clamped = size.clamp(MIN_SIZE, MAX_SIZE);
    let steps = (clamped - MIN_SIZE + SIZE_STEP / 2) / SIZE_STEP;
    (MIN_SIZE + steps * SIZE_STEP).min(MAX_SIZE)
}

pub fn clamp_logo_size(logo_size: u32) -> u32 {
    logo_size.clamp(MIN_LOGO_SIZE, MAX_LOGO_SIZE)
}

pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        return 1.0;
    }
    opacity.clamp(0.0, 1.0)
}

impl QrConfig {
    /// Brings every bounded field back into range. Text and colors are
    /// left untouched.
    pub fn normalize(&mut self) {
        self.size = quantize_size(self.size);
        self.logo_size = clamp_logo_size(self.logo_size);
        self.logo_opacity = clamp_opacity(self.logo_opacity);
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.size) || (self.size - MIN_SIZE) % SIZE_STEP != 0 {
            anyhow::bail!("Size must be {}-{} in steps of {}", MIN_SIZE, MAX_SIZE, SIZE_STEP);
        }

        if !(MIN_LOGO_SIZE..=MAX_LOGO_SIZE).contains(&self.logo_size) {
            anyhow::bail!("Logo size must be {}-{}", MIN_LOGO_SIZE, MAX_LOGO_SIZE);
        }

        if !(0.0..=1.0).contains(&self.logo_opacity) {
            anyhow::bail!("Logo opacity must be between 0 and 1");
        }

        Ok(())
    }

    /// Caption shown under the content editor.
    pub fn length_caption(&self) -> String {
        let count = self.text.chars().count();
        if count == 1 {
            "1 character".to_string()
        } else {
            format!("{} characters", count)
        }
    }
}
