//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify (header-only), decode, and render (cover + focal crop +
//! encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Everything is statically linked into the binary.

use super::params::{OutputFormat, RenderParams};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not an accepted image type: {0}")]
    Unrecognized(String),
    #[error("Failed to decode source image: {0}")]
    Decode(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid target size {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Format of an uploaded image.
///
/// Uploads are accepted in exactly the four encodings the engine writes, so
/// sources share the [`OutputFormat`] enum under this name.
pub type SourceFormat = OutputFormat;

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Format and size read from an image header, before any full decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub format: SourceFormat,
    pub dimensions: Dimensions,
}

/// A decoded source raster.
///
/// Immutable once decoded; every rectangle of a request reads from the same
/// instance.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: DynamicImage,
    format: SourceFormat,
}

impl SourceImage {
    pub fn new(pixels: DynamicImage, format: SourceFormat) -> Self {
        Self { pixels, format }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can serve rayon workers rendering the
/// rectangles of one request in parallel.
pub trait ImageBackend: Sync {
    /// Sniff the format and read dimensions from the header only.
    fn identify(&self, bytes: &[u8]) -> Result<SourceInfo, BackendError>;

    /// Fully decode the source bytes.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Cover-resize, focal-crop and encode one rectangle.
    fn render(&self, source: &SourceImage, params: &RenderParams) -> Result<Vec<u8>, BackendError>;
}
