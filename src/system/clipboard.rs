// src/system/clipboard.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("The clipboard is not available: {0}")]
    Unavailable(#[source] arboard::Error),
    #[error("Could not write to the clipboard: {0}")]
    Write(#[source] arboard::Error),
}

/// Copies `text` to the system clipboard.
pub fn copy_text(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard = arboard::Clipboard::new().map_err(ClipboardError::Unavailable)?;
    clipboard
        .set_text(text.to_string())
        .map_err(ClipboardError::Write)?;
    log::debug!("Copied {} bytes to the clipboard", text.len());
    Ok(())
}
