//! Declarative output configuration.
//!
//! Callers describe the derivatives they want as JSON:
//!
//! ```json
//! {
//!   "outputs": [
//!     { "width": 1920, "height": 1080, "format": "webp", "quality": 80 },
//!     {
//!       "breakpoint": 320,
//!       "format": "jpeg",
//!       "densities": {
//!         "1x": { "width": 320, "height": 480 },
//!         "2x": { "width": 640, "height": 960 }
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Entries with `width` are simple outputs; entries with `breakpoint` and
//! `densities` are density sets. `format` defaults to `jpeg` and `quality`
//! to 85. Integers may be given as numbers or numeric strings.
//!
//! A malformed *document* (invalid JSON, no `outputs` array) is an error.
//! A malformed *entry* is skipped and reported in
//! [`ParsedOutputs::rejected`] so the remaining entries still render.
//! Density labels keep their declaration order and are lower-cased.

use crate::imaging::{OutputFormat, Quality};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputsError {
    #[error("invalid output configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output configuration has no \"outputs\" array")]
    MissingOutputs,
}

/// One explicit rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleOutput {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}

/// One rectangle of a density set, e.g. `"2x" → 640x960`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityVariant {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Several rectangles sharing a breakpoint and format.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityOutput {
    pub breakpoint: u32,
    pub format: OutputFormat,
    pub quality: Quality,
    /// In declaration order.
    pub densities: Vec<DensityVariant>,
}

/// A validated output entry.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSpec {
    Simple(SimpleOutput),
    DensitySet(DensityOutput),
}

impl OutputSpec {
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Simple(s) => s.format,
            Self::DensitySet(d) => d.format,
        }
    }

    pub fn quality(&self) -> Quality {
        match self {
            Self::Simple(s) => s.quality,
            Self::DensitySet(d) => d.quality,
        }
    }

    /// Number of rectangles this entry renders.
    pub fn rectangle_count(&self) -> usize {
        match self {
            Self::Simple(_) => 1,
            Self::DensitySet(d) => d.densities.len(),
        }
    }

    /// One-line human description, e.g. `1920x1080 webp q80`.
    pub fn describe(&self) -> String {
        match self {
            Self::Simple(s) => format!(
                "{}x{} {} q{}",
                s.width,
                s.height,
                s.format,
                s.quality.value()
            ),
            Self::DensitySet(d) => {
                let densities: Vec<String> = d
                    .densities
                    .iter()
                    .map(|v| format!("{} {}x{}", v.label, v.width, v.height))
                    .collect();
                format!(
                    "breakpoint {}px {} q{} [{}]",
                    d.breakpoint,
                    d.format,
                    d.quality.value(),
                    densities.join(", ")
                )
            }
        }
    }
}

/// Why an entry (or a single density of an entry) was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRejection {
    /// Zero-based position in the `outputs` array.
    pub index: usize,
    /// Set when only one density of a density set was skipped.
    pub density: Option<String>,
    pub reason: String,
}

impl std::fmt::Display for EntryRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.density {
            Some(label) => write!(f, "outputs[{}] density {}: {}", self.index, label, self.reason),
            None => write!(f, "outputs[{}]: {}", self.index, self.reason),
        }
    }
}

/// Result of parsing an output configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutputs {
    /// Valid entries, in input order.
    pub specs: Vec<OutputSpec>,
    pub rejected: Vec<EntryRejection>,
}

/// An integer that may arrive as a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInt {
    Int(i64),
    Text(String),
}

impl RawInt {
    fn value(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    width: Option<RawInt>,
    height: Option<RawInt>,
    breakpoint: Option<RawInt>,
    format: Option<String>,
    quality: Option<RawInt>,
    densities: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawDensity {
    width: Option<RawInt>,
    height: Option<RawInt>,
}

/// A target side in `1..=max`.
fn target_side(value: Option<&RawInt>, field: &str, max: u32) -> Result<u32, String> {
    let raw = value.ok_or_else(|| format!("missing {field}"))?;
    match raw.value() {
        Some(n) if n > i64::from(max) => Err(format!("{field} must be at most {max}, got {n}")),
        Some(n) if n > 0 => Ok(n as u32),
        Some(n) => Err(format!("{field} must be positive, got {n}")),
        None => Err(format!("{field} must be an integer")),
    }
}

fn format_of(entry: &RawEntry) -> Result<OutputFormat, String> {
    match &entry.format {
        Some(name) => name.parse::<OutputFormat>().map_err(|e| e.to_string()),
        None => Ok(OutputFormat::Jpeg),
    }
}

fn quality_of(entry: &RawEntry) -> Result<Quality, String> {
    match &entry.quality {
        None => Ok(Quality::default()),
        Some(raw) => match raw.value() {
            Some(q @ 0..=100) => Ok(Quality::new(q as u32)),
            Some(q) => Err(format!("quality must be 0-100, got {q}")),
            None => Err("quality must be an integer".to_string()),
        },
    }
}

fn parse_density_set(
    index: usize,
    entry: &RawEntry,
    densities: &Map<String, Value>,
    max_dimension: u32,
    rejected: &mut Vec<EntryRejection>,
) -> Result<OutputSpec, String> {
    let breakpoint = match entry.breakpoint.as_ref().and_then(RawInt::value) {
        Some(b) if (0..=i64::from(u32::MAX)).contains(&b) => b as u32,
        Some(b) => return Err(format!("breakpoint must not be negative, got {b}")),
        None => return Err("breakpoint must be an integer".to_string()),
    };
    let format = format_of(entry)?;
    let quality = quality_of(entry)?;

    let mut variants = Vec::with_capacity(densities.len());
    for (label, dims) in densities {
        let label = label.to_lowercase();
        let parsed = serde_json::from_value::<RawDensity>(dims.clone())
            .map_err(|e| e.to_string())
            .and_then(|d| {
                Ok(DensityVariant {
                    width: target_side(d.width.as_ref(), "width", max_dimension)?,
                    height: target_side(d.height.as_ref(), "height", max_dimension)?,
                    label: label.clone(),
                })
            });
        match parsed {
            Ok(variant) => variants.push(variant),
            Err(reason) => rejected.push(EntryRejection {
                index,
                density: Some(label),
                reason,
            }),
        }
    }

    if variants.is_empty() {
        return Err("density set has no valid densities".to_string());
    }
    Ok(OutputSpec::DensitySet(DensityOutput {
        breakpoint,
        format,
        quality,
        densities: variants,
    }))
}

fn parse_entry(
    index: usize,
    value: &Value,
    max_dimension: u32,
    rejected: &mut Vec<EntryRejection>,
) -> Result<OutputSpec, String> {
    let entry: RawEntry = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;

    if entry.width.is_some() {
        return Ok(OutputSpec::Simple(SimpleOutput {
            width: target_side(entry.width.as_ref(), "width", max_dimension)?,
            height: target_side(entry.height.as_ref(), "height", max_dimension)?,
            format: format_of(&entry)?,
            quality: quality_of(&entry)?,
        }));
    }

    match (&entry.densities, &entry.breakpoint) {
        (Some(densities), Some(_)) => {
            parse_density_set(index, &entry, densities, max_dimension, rejected)
        }
        _ => Err("entry needs either width/height or breakpoint/densities".to_string()),
    }
}

/// Parse an output configuration document.
///
/// Target widths and heights above `max_dimension` are rejected per entry,
/// like any other invalid size. Invalid entries are logged and collected in
/// [`ParsedOutputs::rejected`]; only a malformed document is an error.
pub fn parse_outputs(json: &str, max_dimension: u32) -> Result<ParsedOutputs, OutputsError> {
    let document: Value = serde_json::from_str(json)?;
    let entries = document
        .get("outputs")
        .and_then(Value::as_array)
        .ok_or(OutputsError::MissingOutputs)?;

    let mut parsed = ParsedOutputs::default();
    for (index, value) in entries.iter().enumerate() {
        match parse_entry(index, value, max_dimension, &mut parsed.rejected) {
            Ok(spec) => parsed.specs.push(spec),
            Err(reason) => parsed.rejected.push(EntryRejection {
                index,
                density: None,
                reason,
            }),
        }
    }

    for rejection in &parsed.rejected {
        log::warn!("skipping {rejection}");
    }
    Ok(parsed)
}
