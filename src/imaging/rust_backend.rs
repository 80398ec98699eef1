//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::guess_format` + `ImageReader::into_dimensions` |
//! | Identify (AVIF) | `avif-parse` container metadata |
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Decode (AVIF) | `avif-parse` + `rav1d`, see [`avif`](super::avif) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Focal crop | `DynamicImage::crop_imm` at the [`calculations`](super::calculations) origin |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` (RGB, alpha dropped) |
//! | Encode → PNG | `PngEncoder::new_with_quality`, compression preset derived from quality |
//! | Encode → WebP | `WebPEncoder::new_lossless` (RGBA) |
//! | Encode → AVIF | `AvifEncoder` (rav1e, speed 6) |

use super::avif;
use super::backend::{
    BackendError, Dimensions, ImageBackend, SourceFormat, SourceImage, SourceInfo,
};
use super::calculations::plan_cover_crop;
use super::params::{OutputFormat, Quality, RenderParams};
use image::codecs::png::{CompressionType, FilterType as PngFilter};
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader};
use std::io::Cursor;

/// Encoder speed for AVIF (rav1e): 1 = slowest/best, 10 = fastest.
const AVIF_SPEED: u8 = 6;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether this build can decode sources of the given format.
///
/// AVIF goes through [`avif`](super::avif); `reading_enabled()` reports
/// `true` for it whenever the encoder is compiled in, so it is not consulted.
pub fn decoding_supported(format: SourceFormat) -> bool {
    format == SourceFormat::Avif || format.image_format().reading_enabled()
}

/// Whether this build can encode outputs in the given format.
pub fn encoding_supported(format: OutputFormat) -> bool {
    format.image_format().writing_enabled()
}

fn sniff_format(bytes: &[u8]) -> Result<SourceFormat, BackendError> {
    let guessed = image::guess_format(bytes)
        .map_err(|e| BackendError::Unrecognized(format!("unrecognised image data: {e}")))?;
    SourceFormat::from_image_format(guessed)
        .ok_or_else(|| BackendError::Unrecognized(format!("{guessed:?} sources are not accepted")))
}

fn reader(
    bytes: &[u8],
    format: SourceFormat,
) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    if !decoding_supported(format) {
        return Err(BackendError::UnsupportedFormat(format!(
            "{format} decoding is not available in this build"
        )));
    }
    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format.image_format());
    Ok(reader)
}

fn map_encode_error(format: OutputFormat, err: ImageError) -> BackendError {
    match err {
        ImageError::Unsupported(e) => BackendError::UnsupportedFormat(format!("{format}: {e}")),
        ImageError::IoError(e) => BackendError::Io(e),
        other => BackendError::ProcessingFailed(format!("{format} encode failed: {other}")),
    }
}

/// PNG compression presets for the 0-9 level scale.
fn png_compression(quality: Quality) -> CompressionType {
    match quality.png_compression_level() {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encode a cropped image into the requested format.
fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    if !encoding_supported(format) {
        return Err(BackendError::UnsupportedFormat(format!(
            "{format} encoding is not available in this build"
        )));
    }

    let pixels = if format.has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let mut buf = Vec::new();
    // Lossy encoders treat 0 as invalid; 1 is the floor of their scale.
    let lossy = quality.value().max(1);
    let result = match format {
        OutputFormat::Jpeg => pixels.write_with_encoder(
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, lossy),
        ),
        OutputFormat::Png => {
            pixels.write_with_encoder(image::codecs::png::PngEncoder::new_with_quality(
                &mut buf,
                png_compression(quality),
                PngFilter::Adaptive,
            ))
        }
        OutputFormat::Webp => {
            pixels.write_with_encoder(image::codecs::webp::WebPEncoder::new_lossless(&mut buf))
        }
        OutputFormat::Avif => pixels.write_with_encoder(
            image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, lossy),
        ),
    };
    result.map_err(|e| map_encode_error(format, e))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<SourceInfo, BackendError> {
        let format = sniff_format(bytes)?;
        let dimensions = if format == SourceFormat::Avif {
            avif::read_dimensions(bytes)?
        } else {
            let (width, height) = reader(bytes, format)?.into_dimensions().map_err(|e| {
                BackendError::Decode(format!("failed to read {format} header: {e}"))
            })?;
            Dimensions { width, height }
        };
        Ok(SourceInfo { format, dimensions })
    }

    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        let format = sniff_format(bytes)?;
        let pixels = if format == SourceFormat::Avif {
            avif::decode(bytes)?
        } else {
            reader(bytes, format)?
                .decode()
                .map_err(|e| BackendError::Decode(format!("failed to decode {format}: {e}")))?
        };
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(BackendError::Decode("image has no pixels".into()));
        }
        Ok(SourceImage::new(pixels, format))
    }

    fn render(&self, source: &SourceImage, params: &RenderParams) -> Result<Vec<u8>, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::InvalidTarget {
                width: params.width,
                height: params.height,
            });
        }

        let plan = plan_cover_crop(
            (source.width(), source.height()),
            (params.width, params.height),
            params.focal,
        );
        let (resized_w, resized_h) = plan.resized;
        let (x, y) = plan.origin;

        let resized = source
            .pixels()
            .resize_exact(resized_w, resized_h, FilterType::Lanczos3);
        let cropped = resized.crop_imm(x, y, params.width, params.height);

        encode(&cropped, params.format, params.quality)
    }
}
