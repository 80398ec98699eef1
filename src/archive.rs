//! Results folders on disk.
//!
//! Each request lands in its own folder under the results directory:
//!
//! ```text
//! results/
//! └── responsive-images-3f9a0c1d2e4b5a69/
//!     ├── beach_1920x800.webp
//!     ├── beach_320x480.jpg
//!     ├── beach_640x960.jpg
//!     └── beach.png              # the original upload
//! ```
//!
//! A folder is written completely or not at all. Files go to a hidden
//! staging folder next to the target, which is renamed into place once every
//! write succeeded. On failure the staging folder is removed and any previous
//! results under the same name are left untouched.

use crate::request::RequestOutcome;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Exactly one normal path component: no separators, no `.` or `..`.
fn is_plain_name(name: &str) -> bool {
    if name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Remove a directory, logging instead of failing.
fn discard(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(dir) {
        log::warn!("could not remove {}: {e}", dir.display());
    }
}

fn write_entries(folder: &Path, outcome: &RequestOutcome) -> Result<(), ArchiveError> {
    fs::create_dir_all(folder)?;
    for entry in &outcome.entries {
        if !is_plain_name(&entry.relative_path) {
            return Err(ArchiveError::InvalidName(entry.relative_path.clone()));
        }
        fs::write(folder.join(&entry.relative_path), &entry.bytes)?;
        log::debug!("wrote {} ({} bytes)", entry.relative_path, entry.bytes.len());
    }
    Ok(())
}

/// Swap a fully written `staging` folder in as `folder`.
fn publish(staging: &Path, folder: &Path, retired: &Path) -> Result<(), ArchiveError> {
    if !folder.exists() {
        fs::rename(staging, folder)?;
        return Ok(());
    }

    discard(retired);
    fs::rename(folder, retired)?;
    if let Err(e) = fs::rename(staging, folder) {
        if let Err(restore) = fs::rename(retired, folder) {
            log::warn!("could not restore {}: {restore}", folder.display());
        }
        return Err(e.into());
    }
    discard(retired);
    Ok(())
}

/// Write every entry of `outcome` into `results_dir/{folder_name}/`.
///
/// An existing folder of the same name is replaced only after the new one
/// has been written in full. Returns the folder path.
pub fn write_results(
    results_dir: &Path,
    outcome: &RequestOutcome,
) -> Result<PathBuf, ArchiveError> {
    let name = &outcome.folder_name;
    if !is_plain_name(name) {
        return Err(ArchiveError::InvalidName(name.clone()));
    }
    let folder = results_dir.join(name);
    let staging = results_dir.join(format!(".{name}.partial"));
    let retired = results_dir.join(format!(".{name}.old"));

    discard(&staging);
    let result = write_entries(&staging, outcome)
        .and_then(|()| publish(&staging, &folder, &retired));
    if result.is_err() {
        discard(&staging);
    }
    result.map(|()| folder)
}

/// Resolve a download request for `name` inside `results_dir`.
///
/// Only plain names are accepted; anything that could step outside the
/// results directory is [`ArchiveError::InvalidName`].
pub fn resolve_download(results_dir: &Path, name: &str) -> Result<PathBuf, ArchiveError> {
    if !is_plain_name(name) {
        return Err(ArchiveError::InvalidName(name.to_string()));
    }
    let path = results_dir.join(name);
    if path.exists() {
        Ok(path)
    } else {
        Err(ArchiveError::NotFound(name.to_string()))
    }
}
