// src/ui/theme.rs

use ratatui::style::{Color, Modifier, Style};

/// The palette shared by all full-screen UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub success: Color,
    pub error: Color,
    pub border: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub code: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            text: Color::Reset,
            muted: Color::DarkGray,
            success: Color::Green,
            error: Color::Red,
            border: Color::Gray,
            selection_fg: Color::Black,
            selection_bg: Color::Cyan,
            code: Color::Yellow,
        }
    }
}

impl Theme {
    pub fn dracula() -> Self {
        Self {
            accent: Color::Rgb(189, 147, 249),
            text: Color::Rgb(248, 248, 242),
            muted: Color::Rgb(98, 114, 164),
            success: Color::Rgb(80, 250, 123),
            error: Color::Rgb(255, 85, 85),
            border: Color::Rgb(68, 71, 90),
            selection_fg: Color::Rgb(40, 42, 54),
            selection_bg: Color::Rgb(255, 121, 198),
            code: Color::Rgb(241, 250, 140),
        }
    }

    /// No colors beyond the terminal defaults; selection is shown reversed.
    pub fn simple() -> Self {
        Self {
            accent: Color::Reset,
            text: Color::Reset,
            muted: Color::Reset,
            success: Color::Reset,
            error: Color::Reset,
            border: Color::Reset,
            selection_fg: Color::Reset,
            selection_bg: Color::Reset,
            code: Color::Reset,
        }
    }

    /// Looks up a theme by its config name. Unknown names fall back to the default palette.
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Self::default(),
            "dracula" => Self::dracula(),
            "simple" => Self::simple(),
            other => {
                log::warn!("Unknown theme '{}', using the default one", other);
                Self::default()
            }
        }
    }

    pub fn selected(&self) -> Style {
        if self.selection_bg == Color::Reset {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(self.selection_fg).bg(self.selection_bg)
        }
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("Dracula"), Theme::dracula());
        assert_eq!(Theme::by_name("simple"), Theme::simple());
        assert_eq!(Theme::by_name("neon"), Theme::default());
    }

    #[test]
    fn test_simple_selection_is_reversed() {
        assert!(Theme::simple().selected().add_modifier.contains(Modifier::REVERSED));
    }
}
