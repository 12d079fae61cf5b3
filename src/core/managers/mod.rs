// src/core/managers/mod.rs

//! # Snippet Managers
//!
//! A manager adapts one external snippet source. The aggregator builds the enabled managers
//! from the config and concatenates their snippets in configured order.

pub mod fslibrary;
pub mod gist;

use crate::core::config::model::{Config, FsLibraryConfig, GistConfig};
use crate::core::paths::PathError;
use crate::core::secrets::{SecretError, SecretStore};
use crate::core::snippet::Snippet;
use crate::models::{ManagerDescription, ManagerInfoLine, SyncEvent};
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error("Snippet cache is unreadable: {0}")]
    Cache(String),
    #[error("Request failed: {0}")]
    Http(String),
    #[error("The access token was rejected: {0}")]
    Unauthorized(String),
    #[error("Invalid file name '{0}'.")]
    InvalidFilename(String),
    #[error("Manager '{0}' is missing required setting '{1}'.")]
    MissingSetting(&'static str, &'static str),
    #[error("Unknown manager '{0}'.")]
    Unknown(String),
}

/// Where a saved assistant script ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnippet {
    pub path: PathBuf,
    pub filename: String,
}

/// A manager that can persist scripts produced by the assistant.
pub trait AssistantSnippetTarget {
    fn save_assistant_snippet(&self, filename: &str, content: &[u8]) -> Result<SavedSnippet, ManagerError>;
}

pub trait Manager: Send + Sync {
    /// Stable config key, e.g. `fsLibrary`.
    fn key(&self) -> &'static str;
    fn description(&self) -> ManagerDescription;
    fn snippets(&self) -> Result<Vec<Arc<dyn Snippet>>, ManagerError>;
    fn info(&self) -> Vec<ManagerInfoLine>;
    /// Refreshes any local cache, reporting progress on `events`.
    /// Returns `false` without sending anything when the manager has nothing to sync.
    fn sync(&self, events: &Sender<SyncEvent>) -> bool;

    fn assistant_target(&self) -> Option<&dyn AssistantSnippetTarget> {
        None
    }
}

// --- CATALOG ---

struct CatalogEntry {
    key: &'static str,
    name: &'static str,
    description: &'static str,
}

static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        key: fslibrary::KEY,
        name: "Filesystem library",
        description: "Scripts stored in local directories",
    },
    CatalogEntry {
        key: gist::KEY,
        name: "GitHub Gist",
        description: "Gists of a GitHub user, cached locally by `sync`",
    },
];

/// Every manager kind this build knows, with its enabled flag taken from `config`.
pub fn catalog(config: &Config) -> Vec<ManagerDescription> {
    CATALOG
        .iter()
        .map(|entry| ManagerDescription {
            key: entry.key.to_string(),
            name: entry.name.to_string(),
            description: entry.description.to_string(),
            enabled: is_enabled(config, entry.key),
        })
        .collect()
}

/// True when `key` already has a config section.
pub fn is_configured(config: &Config, key: &str) -> bool {
    match key {
        fslibrary::KEY => config.manager.fs_library.is_some(),
        gist::KEY => config.manager.github_gist.is_some(),
        _ => false,
    }
}

fn is_enabled(config: &Config, key: &str) -> bool {
    match key {
        fslibrary::KEY => config.manager.fs_library.as_ref().is_some_and(|c| c.enabled),
        gist::KEY => config.manager.github_gist.as_ref().is_some_and(|c| c.enabled),
        _ => false,
    }
}

/// Returns a copy of `config` with the default section for manager `key` added.
pub fn with_default_config(config: &Config, key: &str) -> Result<Config, ManagerError> {
    let mut updated = config.clone();
    match key {
        fslibrary::KEY => updated.manager.fs_library = Some(FsLibraryConfig::default()),
        gist::KEY => updated.manager.github_gist = Some(GistConfig::default()),
        other => return Err(ManagerError::Unknown(other.to_string())),
    }
    Ok(updated)
}

// --- AGGREGATOR ---

pub struct Aggregator {
    managers: Vec<Box<dyn Manager>>,
}

impl Aggregator {
    pub fn new(managers: Vec<Box<dyn Manager>>) -> Self {
        Self { managers }
    }

    /// Builds every enabled manager in configured order.
    pub fn from_config(config: &Config, secrets: Arc<dyn SecretStore>) -> Result<Self, ManagerError> {
        let mut managers: Vec<Box<dyn Manager>> = Vec::new();
        if let Some(fs) = config.manager.fs_library.as_ref().filter(|c| c.enabled) {
            managers.push(Box::new(fslibrary::FsLibraryManager::new(fs.clone())?));
        }
        if let Some(gist) = config.manager.github_gist.as_ref().filter(|c| c.enabled) {
            managers.push(Box::new(gist::GistManager::new(gist.clone(), secrets)?));
        }
        log::debug!("{} manager(s) enabled", managers.len());
        Ok(Self::new(managers))
    }

    pub fn managers(&self) -> &[Box<dyn Manager>] {
        &self.managers
    }

    pub fn into_managers(self) -> Vec<Box<dyn Manager>> {
        self.managers
    }

    /// Collects the snippets of all managers in parallel, keeping manager order.
    /// Ids are not deduplicated. A failing manager is skipped with an error log.
    pub fn snippets(&self) -> Vec<Arc<dyn Snippet>> {
        let per_manager: Vec<Vec<Arc<dyn Snippet>>> = self
            .managers
            .par_iter()
            .map(|manager| match manager.snippets() {
                Ok(snippets) => {
                    log::debug!("Manager '{}' provided {} snippet(s)", manager.key(), snippets.len());
                    snippets
                }
                Err(e) => {
                    log::error!("Manager '{}' failed to list snippets: {}", manager.key(), e);
                    Vec::new()
                }
            })
            .collect();
        per_manager.into_iter().flatten().collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<Arc<dyn Snippet>> {
        self.snippets().into_iter().find(|s| s.id() == id)
    }

    /// The manager that should persist assistant scripts: `preferred` when it can,
    /// else the first manager offering the capability.
    pub fn save_target(&self, preferred: Option<&str>) -> Option<&dyn Manager> {
        let capable = |m: &&Box<dyn Manager>| m.assistant_target().is_some();
        preferred
            .and_then(|key| self.managers.iter().filter(capable).find(|m| m.key() == key))
            .or_else(|| self.managers.iter().find(capable))
            .map(|m| &**m)
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::snippet::StaticSnippet;
    use crate::models::SyncStatus;
    use pretty_assertions::assert_eq;

    /// A manager serving fixed snippets, optionally sending a scripted sync.
    pub(crate) struct FakeManager {
        pub key: &'static str,
        pub ids: Vec<&'static str>,
        pub sync_events: Vec<SyncStatus>,
        pub panic_on_sync: bool,
    }

    impl FakeManager {
        pub(crate) fn new(key: &'static str, ids: Vec<&'static str>) -> Self {
            Self {
                key,
                ids,
                sync_events: Vec::new(),
                panic_on_sync: false,
            }
        }
    }

    impl Manager for FakeManager {
        fn key(&self) -> &'static str {
            self.key
        }

        fn description(&self) -> ManagerDescription {
            ManagerDescription {
                key: self.key.to_string(),
                name: self.key.to_string(),
                description: String::new(),
                enabled: true,
            }
        }

        fn snippets(&self) -> Result<Vec<Arc<dyn Snippet>>, ManagerError> {
            Ok(self
                .ids
                .iter()
                .map(|id| Arc::new(StaticSnippet::new(*id, *id, "echo hi\n")) as Arc<dyn Snippet>)
                .collect())
        }

        fn info(&self) -> Vec<ManagerInfoLine> {
            vec![ManagerInfoLine::new("Snippets", self.ids.len().to_string())]
        }

        fn sync(&self, events: &Sender<SyncEvent>) -> bool {
            if self.panic_on_sync {
                panic!("sync exploded");
            }
            if self.sync_events.is_empty() {
                return false;
            }
            for (i, status) in self.sync_events.iter().enumerate() {
                let _ = events.send(SyncEvent::new(*status, format!("{} step {}", self.key, i)));
            }
            true
        }
    }

    #[test]
    fn test_snippets_keep_manager_order_without_dedup() {
        let aggregator = Aggregator::new(vec![
            Box::new(FakeManager::new("a", vec!["1", "2"])),
            Box::new(FakeManager::new("b", vec!["2", "3"])),
        ]);
        let ids: Vec<String> = aggregator.snippets().iter().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "2", "3"]);
        assert!(aggregator.find_by_id("3").is_some());
        assert!(aggregator.find_by_id("4").is_none());
    }

    #[test]
    fn test_catalog_and_default_config() {
        let config = Config::default();
        let catalog = catalog(&config);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.iter().all(|d| !d.enabled));

        let updated = with_default_config(&config, fslibrary::KEY).unwrap();
        assert!(is_configured(&updated, fslibrary::KEY));
        assert!(catalog_enabled(&updated, fslibrary::KEY));
        assert!(with_default_config(&config, "nope").is_err());
    }

    fn catalog_enabled(config: &Config, key: &str) -> bool {
        catalog(config).iter().any(|d| d.key == key && d.enabled)
    }

    #[test]
    fn test_save_target_prefers_configured_key() {
        let dir = tempfile::tempdir().unwrap();
        let fs_config = FsLibraryConfig {
            library_path: vec![dir.path().display().to_string()],
            ..Default::default()
        };
        let aggregator = Aggregator::new(vec![
            Box::new(FakeManager::new("a", vec![])),
            Box::new(fslibrary::FsLibraryManager::new(fs_config).unwrap()),
        ]);
        assert_eq!(aggregator.save_target(None).map(|m| m.key()), Some(fslibrary::KEY));
        assert_eq!(aggregator.save_target(Some("a")).map(|m| m.key()), Some(fslibrary::KEY));
    }
}
