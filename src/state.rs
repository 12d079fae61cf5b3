// src/state.rs

//! Per-invocation application context shared by every command handler.
//!
//! The config is loaded at most once, on first use, so commands that never touch it (`config
//! init`, `config clean`) work even when the file is missing or outdated.

use crate::core::config::model::Config;
use crate::core::config::{self, ConfigError, ConfigService};
use crate::core::managers::Aggregator;
use crate::core::secrets::{self, SecretStore};
use crate::ui::theme::Theme;
use anyhow::Result;
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub struct AppContext {
    config_override: Option<PathBuf>,
    config: OnceLock<Config>,
    secrets: OnceLock<Arc<dyn SecretStore>>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config_override", &self.config_override)
            .field("config_loaded", &self.config.get().is_some())
            .finish()
    }
}

impl AppContext {
    pub fn new(config_override: Option<PathBuf>) -> Self {
        Self {
            config_override,
            config: OnceLock::new(),
            secrets: OnceLock::new(),
        }
    }

    /// A context whose config is already known. Nothing is read from disk.
    pub fn with_config(config: Config, secrets: Arc<dyn SecretStore>) -> Self {
        let context = Self::new(None);
        let _ = context.config.set(config);
        let _ = context.secrets.set(secrets);
        context
    }

    pub fn config_service(&self) -> Result<ConfigService, ConfigError> {
        ConfigService::resolve(self.config_override.as_deref())
    }

    /// Loads the config on first call. When the file is missing and a user is at the terminal,
    /// offers to create it with discovered defaults.
    pub fn config(&self) -> Result<&Config> {
        if let Some(config) = self.config.get() {
            return Ok(config);
        }

        let service = self.config_service()?;
        let loaded = match service.load() {
            Ok(file) => file.config,
            Err(ConfigError::NotFound(path)) if std::io::stdin().is_terminal() => {
                let create = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("No configuration found at '{}'. Create one now?", path.display()))
                    .default(true)
                    .interact()?;
                if !create {
                    return Err(ConfigError::NotFound(path).into());
                }
                let file = config::discover_defaults();
                service.save(&file)?;
                println!("{} Created '{}'.", "✓".green(), path.display());
                file.config
            }
            Err(e) => return Err(e.into()),
        };

        let _ = self.config.set(loaded);
        self.config
            .get()
            .ok_or_else(|| anyhow::anyhow!("Configuration could not be cached."))
    }

    pub fn secrets(&self) -> Result<Arc<dyn SecretStore>> {
        if let Some(store) = self.secrets.get() {
            return Ok(Arc::clone(store));
        }
        let storage = self.config()?.secret_storage;
        let store: Arc<dyn SecretStore> = Arc::from(secrets::from_config(storage));
        let _ = self.secrets.set(Arc::clone(&store));
        Ok(store)
    }

    /// Builds the enabled managers.
    pub fn aggregator(&self) -> Result<Aggregator> {
        let config = self.config()?;
        Ok(Aggregator::from_config(config, self.secrets()?)?)
    }

    pub fn theme(&self) -> Result<Theme> {
        Ok(Theme::by_name(&self.config()?.style.theme))
    }

    pub fn hide_key_map(&self) -> Result<bool> {
        Ok(self.config()?.style.hide_key_map)
    }
}

// MARK: --- UNIT TESTS ---
