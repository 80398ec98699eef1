//! One processing request, end to end.
//!
//! ```text
//! upload bytes ─┬─ size check
//!               ├─ identify (header only) ─ format + dimension checks
//!               ├─ output config + focal point parsing
//!               ├─ decode
//!               ├─ plan::build_plan ─ artifacts + picture sources
//!               └─ markup::render_picture ─ <picture> snippet
//! ```
//!
//! Everything here is pure: bytes and strings in, a [`RequestOutcome`] out.
//! Persisting the entries is [`crate::archive`]'s job. All cheap validation
//! happens before the full decode, so oversized or malformed requests are
//! rejected without allocating a pixel buffer.

use crate::config::Settings;
use crate::imaging::{
    BackendError, FocalPoint, ImageBackend, InvalidPercentage, SourceInfo,
};
use crate::markup::{PictureContext, render_picture};
use crate::naming::{original_basename, original_filename, results_folder_name, sanitize_base_path};
use crate::outputs::{EntryRejection, OutputsError, parse_outputs};
use crate::plan::{PlanError, PlanEvent, build_plan};
use std::collections::HashMap;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Upload is {size} bytes; the limit is {limit} bytes")]
    UploadTooLarge { size: u64, limit: u64 },
    #[error("Unsupported upload type: {0}")]
    UnsupportedMime(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Image dimensions are too large ({width}x{height}, max {max}x{max} pixels)")]
    OversizeSource { width: u32, height: u32, max: u32 },
    #[error("Failed to load image: {0}")]
    DecodeFailure(String),
    #[error(transparent)]
    InvalidConfig(#[from] OutputsError),
    #[error("Invalid focal point: {0}")]
    InvalidFocalPoint(#[from] InvalidPercentage),
    #[error(transparent)]
    Render(PlanError),
}

impl From<BackendError> for RequestError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unrecognized(msg) => Self::UnsupportedMime(msg),
            BackendError::UnsupportedFormat(msg) => Self::UnsupportedFormat(msg),
            other => Self::DecodeFailure(other.to_string()),
        }
    }
}

impl From<PlanError> for RequestError {
    fn from(err: PlanError) -> Self {
        match err.backend_error() {
            BackendError::UnsupportedFormat(msg) => Self::UnsupportedFormat(msg.clone()),
            _ => Self::Render(err),
        }
    }
}

/// The uploaded source file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-side file name; directories are ignored.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-request inputs besides the upload.
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// Output configuration JSON (see [`crate::outputs`]).
    pub config_json: String,
    /// Horizontal focal point, e.g. `"37.5%"`.
    pub focal_x: String,
    /// Vertical focal point, e.g. `"50%"`.
    pub focal_y: String,
    /// Overrides `output.base_path` from the settings when set.
    pub base_path: Option<String>,
}

impl RequestParams {
    /// Centered focal point, settings base path.
    pub fn new(config_json: impl Into<String>) -> Self {
        Self {
            config_json: config_json.into(),
            focal_x: "50%".to_string(),
            focal_y: "50%".to_string(),
            base_path: None,
        }
    }
}

/// One file of the results folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

/// Everything a successful request produced.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub folder_name: String,
    /// The `<picture>` snippet.
    pub html: String,
    /// Generated files in plan order, then the original upload.
    pub entries: Vec<ArchiveEntry>,
    pub rejected: Vec<EntryRejection>,
    pub duplicates: Vec<String>,
    pub source: SourceInfo,
    pub focal: FocalPoint,
}

impl RequestOutcome {
    /// Number of generated files, not counting the original.
    pub fn generated_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }
}

/// Artifacts followed by the original. Repeated names keep their first
/// position but take the latest bytes.
fn collect_entries(
    artifacts: impl IntoIterator<Item = (String, Vec<u8>)>,
    original: (String, Vec<u8>),
) -> Vec<ArchiveEntry> {
    let mut entries: Vec<ArchiveEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (relative_path, bytes) in artifacts.into_iter().chain(std::iter::once(original)) {
        match positions.get(&relative_path) {
            Some(&i) => entries[i].bytes = bytes,
            None => {
                positions.insert(relative_path.clone(), entries.len());
                entries.push(ArchiveEntry {
                    relative_path,
                    bytes,
                });
            }
        }
    }
    entries
}

/// Run one request.
///
/// Any failure aborts the whole request; nothing partial is returned.
pub fn process_request(
    backend: &impl ImageBackend,
    upload: &Upload,
    params: &RequestParams,
    settings: &Settings,
    events: Option<&Sender<PlanEvent>>,
) -> Result<RequestOutcome, RequestError> {
    let limits = &settings.limits;
    let size = upload.bytes.len() as u64;
    if size > limits.max_upload_bytes {
        return Err(RequestError::UploadTooLarge {
            size,
            limit: limits.max_upload_bytes,
        });
    }

    let info = backend.identify(&upload.bytes)?;
    let (width, height) = (info.dimensions.width, info.dimensions.height);
    if width > limits.max_dimension || height > limits.max_dimension {
        return Err(RequestError::OversizeSource {
            width,
            height,
            max: limits.max_dimension,
        });
    }

    let parsed = parse_outputs(&params.config_json, limits.max_output_dimension)?;
    let focal = FocalPoint::from_percentages(&params.focal_x, &params.focal_y)?;

    let source = backend.decode(&upload.bytes)?;

    let basename = original_basename(&upload.filename);
    let filename = original_filename(&upload.filename);
    let folder_name = results_folder_name(&upload.bytes, &params.config_json);

    let plan = build_plan(backend, &source, &parsed.specs, focal, &basename, events)?;
    drop(source);

    let context = PictureContext {
        base_path: sanitize_base_path(
            params
                .base_path
                .as_deref()
                .unwrap_or(&settings.output.base_path),
        ),
        folder_name: folder_name.clone(),
        original_filename: filename.clone(),
        original_basename: basename,
        original_width: width,
        original_height: height,
    };
    let html = render_picture(&plan.sources, &context);

    let entries = collect_entries(
        plan.artifacts.into_iter().map(|a| (a.filename, a.bytes)),
        (filename, upload.bytes.clone()),
    );

    log::info!(
        "{}: {} files from {}x{} {} (focal {:.3},{:.3})",
        folder_name,
        entries.len(),
        width,
        height,
        info.format,
        focal.x,
        focal.y
    );

    Ok(RequestOutcome {
        folder_name,
        html,
        entries,
        rejected: parsed.rejected,
        duplicates: plan.duplicates,
        source: info,
        focal,
    })
}
