//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! validated parameters, enforce the engine's preconditions, and call the
//! backend.

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::params::RenderParams;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Produce one rectangle: cover-resize, crop toward the focal point, encode.
///
/// The returned bytes decode to exactly `params.width × params.height`.
pub fn produce(
    backend: &impl ImageBackend,
    source: &SourceImage,
    params: &RenderParams,
) -> Result<Vec<u8>> {
    if params.width == 0 || params.height == 0 {
        return Err(BackendError::InvalidTarget {
            width: params.width,
            height: params.height,
        });
    }
    log::debug!(
        "rendering {}x{} {} from {}x{} source (focal {:.3},{:.3})",
        params.width,
        params.height,
        params.format,
        source.width(),
        source.height(),
        params.focal.x,
        params.focal.y
    );
    backend.render(source, params)
}
