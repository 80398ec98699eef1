//! File, folder and URL naming for generated results.
//!
//! Every generated file is named after the upload and its target rectangle:
//!
//! - `beach.png` at 640x960 as JPEG → `beach_640x960.jpg`
//! - `beach.png` at 1920x1080 as WebP → `beach_1920x1080.webp`
//!
//! Names are unique per rectangle and format, not per entry: two entries
//! asking for the same rectangle collide on purpose (see [`crate::plan`]).

use crate::imaging::OutputFormat;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix of every results folder.
pub const FOLDER_PREFIX: &str = "responsive-images";

/// Client filename without directories or extension.
///
/// - `"photos/beach.jpg"` → `"beach"`
/// - `"archive.tar.gz"` → `"archive.tar"`
/// - `".hidden"` → `".hidden"`
/// - `""` → `"image"`
pub fn original_basename(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Client filename with any directory part removed.
pub fn original_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// `{basename}_{width}x{height}.{ext}`
pub fn artifact_filename(basename: &str, width: u32, height: u32, format: OutputFormat) -> String {
    format!("{}_{}x{}.{}", basename, width, height, format.extension())
}

/// Results folder name derived from the request content.
///
/// Identical upload + config pairs map to the same folder, so re-running a
/// request overwrites its previous results instead of piling up copies.
pub fn results_folder_name(upload: &[u8], config_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(upload);
    hasher.update(config_json.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{FOLDER_PREFIX}-{hex}")
}

/// Keep only URL-path-safe characters and drop trailing slashes.
///
/// `"/static/img/"` → `"/static/img"`, `"<script>/x"` → `"script/x"`.
pub fn sanitize_base_path(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '.' | '-'))
        .collect();
    kept.trim_end_matches('/').to_string()
}

/// `{base}/{folder}/{filename}` with trailing slashes trimmed from `base`.
pub fn public_url(base_path: &str, folder: &str, filename: &str) -> String {
    format!("{}/{}/{}", base_path.trim_end_matches('/'), folder, filename)
}
