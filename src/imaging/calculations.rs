//! Pure calculation functions for the cover-and-crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::FocalPoint;

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h.max(tgt_h))
    }
}

/// Top-left corner of a `target`-sized window centred on the focal point,
/// clamped so the window stays inside `resized`.
///
/// Fractional origins are truncated to whole pixels.
pub fn calculate_crop_origin(
    resized: (u32, u32),
    target: (u32, u32),
    focal: FocalPoint,
) -> (u32, u32) {
    let axis = |size: u32, window: u32, fraction: f64| -> u32 {
        let focus = size as f64 * fraction;
        let max = size.saturating_sub(window) as f64;
        (focus - window as f64 / 2.0).clamp(0.0, max) as u32
    };
    (
        axis(resized.0, target.0, focal.x),
        axis(resized.1, target.1, focal.y),
    )
}

/// Geometry of one cover-and-crop operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverCrop {
    /// Intermediate size after the cover resize.
    pub resized: (u32, u32),
    /// Top-left corner of the crop window inside the resized image.
    pub origin: (u32, u32),
    /// Final output size.
    pub target: (u32, u32),
}

/// Plan the full cover resize plus focal crop for one target rectangle.
pub fn plan_cover_crop(source: (u32, u32), target: (u32, u32), focal: FocalPoint) -> CoverCrop {
    let resized = calculate_fill_dimensions(source, target);
    CoverCrop {
        resized,
        origin: calculate_crop_origin(resized, target, focal),
        target,
    }
}
