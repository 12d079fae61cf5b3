// src/core/secrets.rs

//! # Secret Store
//!
//! Opaque key/value storage for credentials such as gist tokens. One entry exists per
//! (service, account) pair and the last write wins.

use crate::constants::KEYRING_SERVICE;
use crate::core::config::model::SecretStorage;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Keychain access failed for '{account}': {source}")]
    Keyring {
        account: String,
        #[source]
        source: keyring::Error,
    },
    #[error("The secret store lock was poisoned.")]
    Poisoned,
}

pub trait SecretStore: Send + Sync {
    fn get(&self, account: &str) -> Result<Option<String>, SecretError>;
    fn set(&self, account: &str, secret: &str) -> Result<(), SecretError>;
    fn delete(&self, account: &str) -> Result<(), SecretError>;
}

/// Builds the store selected by the `secretStorage` setting.
pub fn from_config(storage: SecretStorage) -> Box<dyn SecretStore> {
    match storage {
        SecretStorage::Keyring => Box::new(KeyringStore::new(KEYRING_SERVICE)),
        SecretStorage::None => Box::new(NoopStore),
    }
}

// --- OS KEYCHAIN ---

pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry, SecretError> {
        keyring::Entry::new(&self.service, account).map_err(|source| SecretError::Keyring {
            account: account.to_string(),
            source,
        })
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, account: &str) -> Result<Option<String>, SecretError> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(source) => Err(SecretError::Keyring {
                account: account.to_string(),
                source,
            }),
        }
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), SecretError> {
        log::debug!("Storing secret '{}' in the keychain", account);
        self.entry(account)?
            .set_password(secret)
            .map_err(|source| SecretError::Keyring {
                account: account.to_string(),
                source,
            })
    }

    fn delete(&self, account: &str) -> Result<(), SecretError> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(source) => Err(SecretError::Keyring {
                account: account.to_string(),
                source,
            }),
        }
    }
}

// --- NO STORAGE ---

/// Remembers nothing, so every sync asks again.
pub struct NoopStore;

impl SecretStore for NoopStore {
    fn get(&self, _account: &str) -> Result<Option<String>, SecretError> {
        Ok(None)
    }

    fn set(&self, account: &str, _secret: &str) -> Result<(), SecretError> {
        log::debug!("Secret storage disabled, not keeping '{}'", account);
        Ok(())
    }

    fn delete(&self, _account: &str) -> Result<(), SecretError> {
        Ok(())
    }
}

// --- IN MEMORY ---

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SecretStore for MemoryStore {
    fn get(&self, account: &str) -> Result<Option<String>, SecretError> {
        let entries = self.entries.lock().map_err(|_| SecretError::Poisoned)?;
        Ok(entries.get(account).cloned())
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), SecretError> {
        let mut entries = self.entries.lock().map_err(|_| SecretError::Poisoned)?;
        entries.insert(account.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<(), SecretError> {
        let mut entries = self.entries.lock().map_err(|_| SecretError::Poisoned)?;
        entries.remove(account);
        Ok(())
    }
}
