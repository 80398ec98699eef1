//! Parameter types for image operations.
//!
//! These structs describe *what* to render, not *how*. They are the interface
//! between the plan builder (which decides which rectangles to produce) and
//! the [`backend`](super::backend) (which does the pixel work), so a mock
//! backend can stand in during tests.
//!
//! ## Types
//!
//! - [`Quality`]: Encoding quality (0–100, default 85). Clamped on construction.
//! - [`OutputFormat`]: One of the four encodings the engine targets.
//! - [`FocalPoint`]: Fractional coordinates the crop window centres on.
//! - [`RenderParams`]: Full specification for one rectangle.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quality setting for image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// PNG compression level (0-9) for this quality: higher quality, less effort.
    pub fn png_compression_level(self) -> u8 {
        (9.0 - f64::from(self.0) / 11.11).round().clamp(0.0, 9.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Output encodings the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    /// Canonical lower-case name, as written in output configs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    /// File extension for generated files (`jpg` for JPEG).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            other => other.name(),
        }
    }

    /// Subtype for the `type="image/…"` attribute.
    pub fn mime_subtype(self) -> &'static str {
        self.name()
    }

    /// Whether the encoding carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
            Self::Avif => image::ImageFormat::Avif,
        }
    }

    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::Webp),
            image::ImageFormat::Avif => Some(Self::Avif),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported format '{0}' (expected jpeg, png, webp or avif)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    /// Case-insensitive; `jpg` is accepted as an alias of `jpeg`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            "avif" => Ok(Self::Avif),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Point of interest in fractional coordinates of the resized image.
///
/// Both axes are kept inside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
}

impl FocalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    pub fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }

    /// Parse a pair of percentage strings such as `"37.5%"` and `"80%"`.
    pub fn from_percentages(x: &str, y: &str) -> Result<Self, InvalidPercentage> {
        Ok(Self::new(parse_percentage(x)?, parse_percentage(y)?))
    }
}

impl Default for FocalPoint {
    fn default() -> Self {
        Self::center()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid percentage '{0}'")]
pub struct InvalidPercentage(pub String);

/// Parse `"37.5%"` (or `"37.5"`) into the fraction `0.375`.
pub fn parse_percentage(value: &str) -> Result<f64, InvalidPercentage> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n / 100.0),
        _ => Err(InvalidPercentage(value.to_string())),
    }
}

/// Everything the engine needs to produce one rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub width: u32,
    pub height: u32,
    pub focal: FocalPoint,
    pub format: OutputFormat,
    pub quality: Quality,
}
