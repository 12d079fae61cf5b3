// src/core/managers/fslibrary.rs

use super::{AssistantSnippetTarget, Manager, ManagerError, SavedSnippet};
use crate::core::config::model::FsLibraryConfig;
use crate::core::paths;
use crate::core::snippet::{FileSnippet, Snippet};
use crate::models::{ManagerDescription, ManagerInfoLine, SyncEvent};
use crossbeam_channel::Sender;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub const KEY: &str = "fsLibrary";

const ID_HASH_BYTES: usize = 16;

/// Serves script files found under one or more local directories.
#[derive(Debug)]
pub struct FsLibraryManager {
    config: FsLibraryConfig,
    roots: Vec<PathBuf>,
    patterns: Vec<Regex>,
}

impl FsLibraryManager {
    pub fn new(config: FsLibraryConfig) -> Result<Self, ManagerError> {
        let roots = config
            .library_path
            .iter()
            .map(|p| paths::expand_path(p))
            .collect::<Result<Vec<_>, _>>()?;
        let patterns = config
            .suffix_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ManagerError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            config,
            roots,
            patterns,
        })
    }

    fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(file_name))
    }

    fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                log::warn!("Library path '{}' is not a directory, skipping.", root.display());
                continue;
            }
            let entries = WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        log::debug!("Skipping unreadable entry: {}", e);
                        None
                    }
                });
            for entry in entries {
                if entry.file_type().is_file() && self.matches(&entry.file_name().to_string_lossy()) {
                    files.push(entry.into_path());
                }
            }
        }
        files
    }

    fn save_directory(&self) -> Result<PathBuf, ManagerError> {
        match &self.config.save_directory {
            Some(dir) => Ok(paths::expand_path(dir)?),
            None => self
                .roots
                .first()
                .cloned()
                .ok_or(ManagerError::MissingSetting(KEY, "libraryPath")),
        }
    }
}

/// Stable id of a library file: `fs-` plus the truncated blake3 hash of its canonical path.
pub fn snippet_id(path: &Path) -> String {
    let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let hash = blake3::hash(canonical.to_string_lossy().as_bytes());
    let truncated = hash.as_bytes().get(..ID_HASH_BYTES).unwrap_or_default();
    format!("fs-{}", hex::encode(truncated))
}

/// Returns a path inside `dir` for `filename` that does not exist yet, adding `-1`, `-2`, ...
/// before the extension on collisions.
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };
    (1..)
        .map(|n| match extension {
            Some(ext) => dir.join(format!("{}-{}.{}", stem, n, ext)),
            None => dir.join(format!("{}-{}", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

impl Manager for FsLibraryManager {
    fn key(&self) -> &'static str {
        KEY
    }

    fn description(&self) -> ManagerDescription {
        ManagerDescription {
            key: KEY.to_string(),
            name: "Filesystem library".to_string(),
            description: "Scripts stored in local directories".to_string(),
            enabled: self.config.enabled,
        }
    }

    fn snippets(&self) -> Result<Vec<Arc<dyn Snippet>>, ManagerError> {
        let snippets = self
            .files()
            .into_iter()
            .map(|path| {
                let snippet = FileSnippet::new(snippet_id(&path), &path, self.config.hide_title_in_preview);
                let snippet = if self.config.lazy_open { snippet } else { snippet.eager() };
                Arc::new(snippet) as Arc<dyn Snippet>
            })
            .collect();
        Ok(snippets)
    }

    fn info(&self) -> Vec<ManagerInfoLine> {
        let roots = self
            .roots
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let save = self
            .save_directory()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|e| e.to_string());
        vec![
            ManagerInfoLine::new("Library paths", roots),
            ManagerInfoLine::new("Suffix patterns", self.config.suffix_regex.join(", ")),
            ManagerInfoLine::new("Snippets", self.files().len().to_string()),
            ManagerInfoLine::new("Save directory", save),
        ]
    }

    fn sync(&self, _events: &Sender<SyncEvent>) -> bool {
        false
    }

    fn assistant_target(&self) -> Option<&dyn AssistantSnippetTarget> {
        Some(self)
    }
}

impl AssistantSnippetTarget for FsLibraryManager {
    fn save_assistant_snippet(&self, filename: &str, content: &[u8]) -> Result<SavedSnippet, ManagerError> {
        // Only the final component is honoured so a model cannot write outside the library.
        let name = Path::new(filename.trim())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty() && n != "." && n != "..")
            .ok_or_else(|| ManagerError::InvalidFilename(filename.to_string()))?;

        let dir = self.save_directory()?;
        fs::create_dir_all(&dir).map_err(|source| ManagerError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = unique_path(&dir, &name);
        fs::write(&path, content).map_err(|source| ManagerError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("Saved assistant snippet to '{}'", path.display());

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name);
        Ok(SavedSnippet { path, filename })
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn manager_for(dir: &Path) -> FsLibraryManager {
        FsLibraryManager::new(FsLibraryConfig {
            library_path: vec![dir.display().to_string()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_lists_matching_files_recursively() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("net")).unwrap();
        fs::write(dir.path().join("a.sh"), "#\n# Alpha\n#\necho a\n").unwrap();
        fs::write(dir.path().join("net").join("b.bash"), "echo b\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "no").unwrap();

        let manager = manager_for(dir.path());
        let snippets = manager.snippets().unwrap();
        let titles: Vec<&str> = snippets.iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec!["Alpha", "b.bash"]);
        assert!(snippets.iter().all(|s| s.id().starts_with("fs-")));
        assert!(!manager.sync(&crossbeam_channel::unbounded().0));
    }

    #[test]
    fn test_snippet_id_is_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.sh");
        fs::write(&path, "ls").unwrap();
        let id = snippet_id(&path);
        assert_eq!(id, snippet_id(&path));
        assert_eq!(id.len(), 3 + ID_HASH_BYTES * 2);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let result = FsLibraryManager::new(FsLibraryConfig {
            suffix_regex: vec!["(".to_string()],
            ..Default::default()
        });
        assert!(matches!(result, Err(ManagerError::InvalidPattern { .. })));
    }

    #[test]
    fn test_save_resolves_collisions() {
        let dir = tempdir().unwrap();
        let manager = manager_for(dir.path());
        let first = manager.save_assistant_snippet("deploy.sh", b"echo 1\n").unwrap();
        let second = manager.save_assistant_snippet("deploy.sh", b"echo 2\n").unwrap();
        let third = manager.save_assistant_snippet("../deploy.sh", b"echo 3\n").unwrap();

        assert_eq!(first.filename, "deploy.sh");
        assert_eq!(second.filename, "deploy-1.sh");
        assert_eq!(third.filename, "deploy-2.sh");
        assert_eq!(fs::read_to_string(&second.path).unwrap(), "echo 2\n");
        assert!(manager.save_assistant_snippet("..", b"").is_err());
    }

    #[test]
    fn test_info_lines() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.sh"), "ls").unwrap();
        let info = manager_for(dir.path()).info();
        let snippets = info.iter().find(|l| l.key == "Snippets").unwrap();
        assert_eq!(snippets.value, "1");
    }
}
