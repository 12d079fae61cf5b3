// src/ui/mod.rs

//! # Terminal UIs
//!
//! Full-screen screens built on `ratatui`. Every screen is a plain state machine (`handle_*`
//! methods that take key events and messages) plus a `run` loop that owns the terminal. The
//! loops never block on I/O; workers talk to them over channels.

pub mod chat;
pub mod form;
pub mod overlay;
pub mod picker;
pub mod sync_screen;
pub mod text_input;
pub mod theme;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Braille spinner frames shared by the chat and sync screens.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES
        .get(tick % SPINNER_FRAMES.len())
        .copied()
        .unwrap_or(" ")
}

pub fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Raw mode plus alternate screen, restored when the session is dropped.
pub struct TerminalSession {
    terminal: Tui,
    active: bool,
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("active", &self.active)
            .finish()
    }
}

impl TerminalSession {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        // Undo raw mode if anything below fails.
        let raw_guard = scopeguard::guard((), |_| {
            let _ = disable_raw_mode();
        });
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        scopeguard::ScopeGuard::into_inner(raw_guard);
        log::trace!("Entered full-screen mode");
        Ok(Self {
            terminal,
            active: true,
        })
    }

    pub fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }

    /// Leaves full-screen mode while `f` runs (an editor, a child process), then comes back.
    pub fn suspend<R>(&mut self, f: impl FnOnce() -> R) -> io::Result<R> {
        self.leave()?;
        let result = f();
        enable_raw_mode()?;
        crossterm::execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        self.active = true;
        self.terminal.clear()?;
        Ok(result)
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        crossterm::execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            log::warn!("Failed to restore the terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(spinner_frame(0), "⠋");
        assert_eq!(spinner_frame(SPINNER_FRAMES.len() + 1), "⠙");
    }

    #[test]
    fn test_is_ctrl_c() {
        assert!(is_ctrl_c(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_ctrl_c(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }
}
