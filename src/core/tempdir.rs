// src/core/tempdir.rs

use crate::constants::TEMP_DIR_PREFIX;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// A private directory for files handed to external programs such as the editor.
///
/// Every file created through the service is tracked; all of them (and the directory) are
/// removed when the service is dropped.
#[derive(Debug)]
pub struct TempDirService {
    dir: TempDir,
    files: Mutex<Vec<PathBuf>>,
}

impl TempDirService {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(TEMP_DIR_PREFIX).tempdir()?;
        log::debug!("Created temp directory '{}'", dir.path().display());
        Ok(Self {
            dir,
            files: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `content` to `name` inside the directory and tracks the file.
    pub fn create_file(&self, name: &str, content: &str) -> io::Result<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid file name '{}'", name)))?;
        let path = self.dir.path().join(file_name);
        fs::write(&path, content)?;
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.clone());
        Ok(path)
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Drop for TempDirService {
    fn drop(&mut self) {
        let files = self.files.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        for file in files.drain(..) {
            if let Err(e) = fs::remove_file(&file) {
                if e.kind() != io::ErrorKind::NotFound {
                    log::warn!("Failed to remove temp file '{}': {}", file.display(), e);
                }
            }
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_are_removed_on_drop() {
        let service = TempDirService::new().unwrap();
        let a = service.create_file("a.sh", "echo a\n").unwrap();
        let b = service.create_file("nested/b.sh", "echo b\n").unwrap();
        let dir = service.path().to_path_buf();

        assert_eq!(fs::read_to_string(&a).unwrap(), "echo a\n");
        assert_eq!(b.parent().unwrap(), dir);
        assert_eq!(service.files().len(), 2);

        drop(service);
        assert!(!a.exists());
        assert!(!b.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let service = TempDirService::new().unwrap();
        assert!(service.create_file("..", "x").is_err());
    }
}
