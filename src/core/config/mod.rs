// src/core/config/mod.rs

//! # Configuration Service
//!
//! Owns the YAML config file: where it lives, how it is created with discovered defaults,
//! how it is validated on load, and how it is rewritten (edits, migrations, `assistant
//! enable`, `manager add`). Every rewrite goes through a diff shown to the user first.

pub mod diff;
pub mod migrations;
pub mod model;

use crate::constants::{APP_NAME, CONFIG_FILENAME, CURRENT_CONFIG_VERSION};
use crate::core::paths;
use model::{ConfigFile, FsLibraryConfig};
use semver::Version;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration file found at '{0}'.")]
    NotFound(PathBuf),
    #[error("Could not determine the configuration directory.")]
    ConfigDirNotFound,
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Configuration version {found} is older than {current} and needs to be migrated.")]
    NeedsMigration { found: String, current: String },
    #[error("Configuration version {0} is newer than this build supports ({current}).", current = CURRENT_CONFIG_VERSION)]
    UnsupportedVersion(String),
    #[error("No migration path starts at version {0}.")]
    NoMigrationPath(String),
    #[error("Migration {from} -> {to} failed: {reason}")]
    MigrationFailed {
        from: String,
        to: String,
        reason: String,
    },
}

/// The outcome of planning a migration: the document before and after the full chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub from: String,
    pub to: String,
    pub before: String,
    pub after: String,
}

/// Returns the default config path: `$XDG_CONFIG_HOME/snipforge/config.yaml`,
/// else the platform config directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(base.join(APP_NAME).join(CONFIG_FILENAME))
}

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `override_path` when given, else the default location.
    pub fn resolve(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match override_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        log::debug!("Using configuration file '{}'", path.display());
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the raw document.
    pub fn read_raw(&self) -> Result<String, ConfigError> {
        if !self.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }
        fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads and validates the config. Older versions are rejected with `NeedsMigration`.
    pub fn load(&self) -> Result<ConfigFile, ConfigError> {
        let raw = self.read_raw()?;
        parse_current(&raw)
    }

    /// Writes `file` to disk, creating the parent directory when needed.
    pub fn save(&self, file: &ConfigFile) -> Result<(), ConfigError> {
        let yaml = to_yaml(file)?;
        self.write_raw(&yaml)
    }

    pub fn write_raw(&self, yaml: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, yaml).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Configuration written to '{}'", self.path.display());
        Ok(())
    }

    pub fn delete(&self) -> Result<(), ConfigError> {
        if !self.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }
        fs::remove_file(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Computes the migrated document without touching the file.
    /// Returns `None` when the file is already current.
    pub fn plan_migration(&self) -> Result<Option<MigrationPlan>, ConfigError> {
        let before = self.read_raw()?;
        let from = migrations::document_version(before.as_bytes())?;
        if from == CURRENT_CONFIG_VERSION {
            return Ok(None);
        }
        let chain = migrations::chain_from(&from)?;
        let after_bytes = migrations::run_chain(before.as_bytes(), chain)?;
        let after = String::from_utf8(after_bytes)
            .map_err(|e| ConfigError::Invalid(format!("migrated document is not UTF-8: {}", e)))?;
        // The result must load under the current schema before anything is written.
        parse_current(&after)?;
        Ok(Some(MigrationPlan {
            from,
            to: CURRENT_CONFIG_VERSION.to_string(),
            before,
            after,
        }))
    }
}

/// Parses a document that must be at the current version.
pub fn parse_current(raw: &str) -> Result<ConfigFile, ConfigError> {
    let found = migrations::document_version(raw.as_bytes())?;
    check_version(&found)?;
    let file: ConfigFile = serde_yaml::from_str(raw)?;
    Ok(file)
}

fn check_version(found: &str) -> Result<(), ConfigError> {
    let parse = |v: &str| {
        Version::parse(v).map_err(|e| ConfigError::Invalid(format!("bad version '{}': {}", v, e)))
    };
    let found_version = parse(found)?;
    let current_version = parse(CURRENT_CONFIG_VERSION)?;
    if found_version < current_version {
        return Err(ConfigError::NeedsMigration {
            found: found.to_string(),
            current: CURRENT_CONFIG_VERSION.to_string(),
        });
    }
    if found_version > current_version {
        return Err(ConfigError::UnsupportedVersion(found.to_string()));
    }
    Ok(())
}

pub fn to_yaml(file: &ConfigFile) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(file)?)
}

/// Builds a fresh config from the environment: editor from `$VISUAL`/`$EDITOR`, shell from
/// `$SHELL`, and a filesystem library on `~/snippets` when that directory exists.
pub fn discover_defaults() -> ConfigFile {
    let mut file = ConfigFile::default();
    let config = &mut file.config;

    config.editor = env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_default();
    config.scripts.shell = env::var("SHELL").unwrap_or_default();

    let library = FsLibraryConfig::default();
    let has_library = library
        .library_path
        .first()
        .and_then(|p| paths::expand_path(p).ok())
        .is_some_and(|p| p.is_dir());
    if has_library {
        log::debug!("Found a snippet directory, enabling the filesystem library");
        config.manager.fs_library = Some(library);
    }
    file
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let service = ConfigService::new(dir.path().join("nested").join("config.yaml"));
        assert!(matches!(service.load(), Err(ConfigError::NotFound(_))));

        let mut file = ConfigFile::default();
        file.config.editor = "nano".to_string();
        service.save(&file).unwrap();
        assert_eq!(service.load().unwrap(), file);
    }

    #[test]
    fn test_old_version_needs_migration() {
        let err = parse_current("version: 1.1.0\nconfig: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::NeedsMigration { found, .. } if found == "1.1.0"));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = parse_current("version: 9.0.0\nconfig: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_plan_migration_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let original = "version: 1.1.0\nconfig:\n  style:\n    theme: dracula\n";
        fs::write(&path, original).unwrap();

        let service = ConfigService::new(&path);
        let plan = service.plan_migration().unwrap().unwrap();
        assert_eq!(plan.from, "1.1.0");
        assert_eq!(plan.to, CURRENT_CONFIG_VERSION);
        assert!(plan.after.contains("hideKeyMap: true"));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);

        service.write_raw(&plan.after).unwrap();
        let loaded = service.load().unwrap();
        assert_eq!(loaded.config.style.theme, "dracula");
        assert!(service.plan_migration().unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let service = ConfigService::new(dir.path().join("config.yaml"));
        service.save(&ConfigFile::default()).unwrap();
        service.delete().unwrap();
        assert!(!service.exists());
        assert!(matches!(service.delete(), Err(ConfigError::NotFound(_))));
    }
}
