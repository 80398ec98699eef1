//! Image processing: the resize-crop engine.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions`, AVIF via `avif-parse` (header only) |
//! | **Decode** | `image` crate decoders (JPEG, PNG, WebP), AVIF via `rav1d` |
//! | **Cover + focal crop** | Lanczos3 `resize_exact` + `crop_imm` |
//! | **Encode** | JPEG, PNG, WebP (lossless), AVIF (rav1e) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for cover and crop geometry (unit testable)
//! - **Parameters**: Data structures describing one render
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

mod avif;
pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{
    BackendError, Dimensions, ImageBackend, SourceFormat, SourceImage, SourceInfo,
};
pub use calculations::{CoverCrop, plan_cover_crop};
pub use operations::produce;
pub use params::{
    FocalPoint, InvalidPercentage, OutputFormat, Quality, RenderParams, UnknownFormat,
    parse_percentage,
};
pub use rust_backend::RustBackend;
