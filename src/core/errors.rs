// src/core/errors.rs

use thiserror::Error;

/// User-facing outcomes that end a command without being a malfunction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AppError {
    #[error("No snippets available. Configure a manager with `snipforge manager add`.")]
    NoSnippetsAvailable,
    #[error("No snippet with id '{0}' was found.")]
    SnippetIdNotFound(String),
    #[error("Operation cancelled.")]
    Cancelled,
}
