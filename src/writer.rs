//! Content-compared file writes
//!
//! Downstream deploys key off whether an artifact's bytes changed, so a file
//! is only touched when its new content differs from what is on disk.

use crate::error::{HistoryError, Result};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` unless the file already holds exactly those bytes.
///
/// Returns `true` when the file was written. The new content goes to a
/// sibling temp file that is renamed over `path`, so readers see either the
/// old or the new artifact.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == bytes => {
            log::info!(
                "Content for {} has not changed, skipping write",
                path.display()
            );
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            log::warn!(
                "Could not read existing {} for comparison, writing anyway: {}",
                path.display(),
                e
            );
        }
    }

    let write_failed = |source: std::io::Error| HistoryError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }

    let tmp = temp_sibling(path);
    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(write_failed(e));
    }

    log::info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(true)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}
