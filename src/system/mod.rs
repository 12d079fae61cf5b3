//! # System Interaction Layer
//!
//! Leaf services that touch the operating system on behalf of the core: running scripts in
//! the user's shell, handing files to the editor, writing the clipboard, and bridging worker
//! threads into async HTTP.
//!
//! ## Modules
//!
//! - **`executor`**: Runs a script with `<shell> -c`, either sharing the terminal or capturing
//!   merged stdout/stderr line by line for the assistant history.
//! - **`editor`**: Launches the configured editor on a file and waits for it.
//! - **`clipboard`**: Copies rendered snippets to the system clipboard.
//! - **`runtime`**: A small `block_on` bridge for worker threads that call async clients.

pub mod clipboard;
pub mod editor;
pub mod executor;
pub mod runtime;
