// src/core/paths.rs

use crate::constants::APP_NAME;
use lazy_static::lazy_static;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref CACHE_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find the system cache directory.")]
    CacheDirNotFound,
    #[error("Could not create directory at '{path}': {source}")]
    DirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to expand path '{path}': {reason}")]
    Expansion { path: String, reason: String },
}

/// Returns the per-user cache directory (`~/.cache/snipforge` on Linux), creating it if needed.
///
/// Memoized: the first call computes and caches the path.
pub fn cache_dir() -> Result<PathBuf, PathError> {
    let mut cached = CACHE_DIR.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    // 1. Find the platform cache directory.
    let path = dirs::cache_dir()
        .ok_or(PathError::CacheDirNotFound)?
        .join(APP_NAME);

    // 2. Make sure it exists.
    if !path.exists() {
        fs::create_dir_all(&path).map_err(|e| PathError::DirCreation {
            path: path.display().to_string(),
            source: e,
        })?;
    }

    // 3. Remember it.
    *cached = Some(path.clone());
    Ok(path)
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a configured path.
pub fn expand_path(raw: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(raw).map_err(|e| PathError::Expansion {
        path: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}
