//! Shared test utilities for the focal-crop test suite.
//!
//! Provides fixture builders for source images and output specs, plus lookup
//! helpers that panic with a readable message on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let specs = vec![
//!     simple_spec(1920, 1080, OutputFormat::Webp),
//!     density_spec(320, &[("1x", 320, 480), ("2x", 640, 960)]),
//! ];
//! let plan = build_plan(&MockBackend::new(), &mock_source(4000, 3000), &specs, ...);
//! let entry = find_entry(&outcome, "beach_320x480.jpg");
//! ```

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use crate::imaging::{OutputFormat, Quality, SourceImage};
use crate::outputs::{DensityOutput, DensityVariant, OutputSpec, SimpleOutput};
use crate::request::{ArchiveEntry, RequestOutcome};

// =========================================================================
// Image fixtures
// =========================================================================

/// RGBA gradient with a translucent lower half.
pub fn rgba_test_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if y < height / 2 { 255 } else { 128 };
        Rgba([(x % 256) as u8, (y % 256) as u8, 96, alpha])
    })
}

/// Encode a gradient image of the given size in `format`.
///
/// JPEG and AVIF fixtures are opaque RGB.
pub fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(rgba_test_image(width, height));
    let img = match format {
        ImageFormat::Jpeg | ImageFormat::Avif => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A blank decoded source, for plans run against the mock backend.
pub fn mock_source(width: u32, height: u32) -> SourceImage {
    SourceImage::new(DynamicImage::new_rgb8(width, height), OutputFormat::Jpeg)
}

// =========================================================================
// Output spec builders
// =========================================================================

pub fn simple_spec(width: u32, height: u32, format: OutputFormat) -> OutputSpec {
    OutputSpec::Simple(SimpleOutput {
        width,
        height,
        format,
        quality: Quality::default(),
    })
}

/// JPEG density set; each density is `(label, width, height)`.
pub fn density_spec(breakpoint: u32, densities: &[(&str, u32, u32)]) -> OutputSpec {
    OutputSpec::DensitySet(DensityOutput {
        breakpoint,
        format: OutputFormat::Jpeg,
        quality: Quality::default(),
        densities: densities
            .iter()
            .map(|(label, width, height)| DensityVariant {
                label: label.to_string(),
                width: *width,
                height: *height,
            })
            .collect(),
    })
}

/// Three outputs: a WebP, a default JPEG and a 1x/2x density set.
pub const SAMPLE_OUTPUTS_JSON: &str = r#"{
    "outputs": [
        {"width": 1920, "height": 800, "format": "webp", "quality": 80},
        {"width": 768, "height": 432},
        {
            "breakpoint": 320,
            "format": "jpeg",
            "densities": {
                "1x": {"width": 320, "height": 480},
                "2x": {"width": 640, "height": 960}
            }
        }
    ]
}"#;

// =========================================================================
// Outcome lookups: panics with a clear message on miss
// =========================================================================

/// Find an archive entry by relative path. Panics if not found.
pub fn find_entry<'a>(outcome: &'a RequestOutcome, path: &str) -> &'a ArchiveEntry {
    outcome
        .entries
        .iter()
        .find(|e| e.relative_path == path)
        .unwrap_or_else(|| {
            panic!(
                "entry '{path}' not found. Available: {:?}",
                entry_paths(outcome)
            )
        })
}

/// All archive entry paths in write order.
pub fn entry_paths(outcome: &RequestOutcome) -> Vec<&str> {
    outcome
        .entries
        .iter()
        .map(|e| e.relative_path.as_str())
        .collect()
}
