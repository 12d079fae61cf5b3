// src/ui/form/field.rs

use super::completion;
use crate::models::{Parameter, ParameterType};
use crate::ui::text_input::TextInput;
use crossterm::event::{KeyCode, KeyEvent};
use std::ops::Range;

/// One entry of a field's dropdown, with the part matching the typed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub highlight: Option<Range<usize>>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: String,
    pub description: String,
    pub param_type: ParameterType,
    input: TextInput,
    /// Allowed values offered in the dropdown of `Value` fields.
    options: Vec<String>,
    /// Set once the user types. A prefilled or picked value does not narrow the options.
    edited: bool,
    suggestions: Vec<Suggestion>,
    highlighted: Option<usize>,
}

impl Field {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        let mut field = Self {
            label: label.into(),
            description: String::new(),
            param_type: ParameterType::Value,
            input: TextInput::new(value),
            options: Vec::new(),
            edited: false,
            suggestions: Vec::new(),
            highlighted: None,
        };
        field.refresh();
        field
    }

    pub fn from_parameter(parameter: &Parameter, value: &str) -> Self {
        let mut field = Self {
            label: parameter.name.clone(),
            description: parameter.description.clone(),
            param_type: parameter.param_type,
            input: TextInput::new(value),
            options: match parameter.param_type {
                ParameterType::Value => parameter.values.clone(),
                _ => Vec::new(),
            },
            edited: false,
            suggestions: Vec::new(),
            highlighted: None,
        };
        field.refresh();
        field
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    /// The text to draw: masked for passwords.
    pub fn display_value(&self) -> String {
        match self.param_type {
            ParameterType::Password => self.input.masked(),
            _ => self.input.value().to_string(),
        }
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Recomputes the dropdown after the value changed.
    fn refresh(&mut self) {
        self.highlighted = None;
        self.suggestions = match self.param_type {
            ParameterType::Value => completion::filter_options(&self.options, self.option_query())
                .into_iter()
                .filter_map(|(index, highlight)| {
                    self.options.get(index).map(|text| Suggestion {
                        text: text.clone(),
                        highlight,
                    })
                })
                .collect(),
            ParameterType::Path => completion::complete_path(self.input.value())
                .into_iter()
                .map(|text| Suggestion {
                    highlight: Some(0..self.input.value().len()),
                    text,
                })
                .collect(),
            ParameterType::Password => Vec::new(),
        };
    }

    fn option_query(&self) -> &str {
        if self.edited { self.input.value() } else { "" }
    }

    /// Handles a key aimed at this field. Returns false when the form should act on it instead.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Down if !self.suggestions.is_empty() => {
                let next = self.highlighted.map_or(0, |i| i + 1);
                self.highlighted = Some(next.min(self.suggestions.len() - 1));
                true
            }
            KeyCode::Up if self.highlighted.is_some() => {
                self.highlighted = self.highlighted.and_then(|i| i.checked_sub(1));
                true
            }
            KeyCode::Enter => match self.highlighted.and_then(|i| self.suggestions.get(i)) {
                Some(suggestion) => {
                    let text = suggestion.text.clone();
                    self.input.set_value(text);
                    self.edited = false;
                    self.refresh();
                    true
                }
                None => false,
            },
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => false,
            _ => {
                if self.input.handle_key(key) {
                    self.edited = true;
                    self.refresh();
                }
                true
            }
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parameters::{initial_values, parse_parameters};
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mode_parameter() -> Parameter {
        Parameter {
            values: vec!["dev".into(), "staging".into(), "prod".into()],
            ..Parameter::new("MODE")
        }
    }

    #[test]
    fn test_value_field_filters_and_applies_option() {
        let mut field = Field::from_parameter(&mode_parameter(), "");
        assert_eq!(field.suggestions().len(), 3);

        field.handle_key(&key(KeyCode::Char('A')));
        let texts: Vec<&str> = field.suggestions().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["staging"]);
        assert_eq!(field.suggestions()[0].highlight, Some(2..3));

        // Enter without a highlighted option is left to the form.
        assert!(!field.handle_key(&key(KeyCode::Enter)));
        assert!(field.handle_key(&key(KeyCode::Down)));
        assert!(field.handle_key(&key(KeyCode::Enter)));
        assert_eq!(field.value(), "staging");
        assert_eq!(field.highlighted(), None);
    }

    #[test]
    fn test_prefilled_default_lists_every_option() {
        let parameters = parse_parameters("# ${MODE} Values: dev,staging,prod\n# ${MODE} Default: dev\necho ${MODE}\n");
        let initial = initial_values(&parameters, &[]);
        let mut field = Field::from_parameter(&parameters[0], &initial[0]);
        assert_eq!(field.value(), "dev");
        assert_eq!(field.suggestions().len(), 3);

        // Typing narrows from then on.
        field.handle_key(&key(KeyCode::Backspace));
        field.handle_key(&key(KeyCode::Backspace));
        field.handle_key(&key(KeyCode::Backspace));
        field.handle_key(&key(KeyCode::Char('p')));
        let texts: Vec<&str> = field.suggestions().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["prod"]);
    }

    #[test]
    fn test_picked_option_keeps_the_list_open() {
        let mut field = Field::from_parameter(&mode_parameter(), "");
        field.handle_key(&key(KeyCode::Down));
        field.handle_key(&key(KeyCode::Down));
        assert!(field.handle_key(&key(KeyCode::Enter)));
        assert_eq!(field.value(), "staging");
        assert_eq!(field.suggestions().len(), 3);
    }

    #[test]
    fn test_highlight_moves_within_bounds() {
        let mut field = Field::from_parameter(&mode_parameter(), "");
        for _ in 0..5 {
            field.handle_key(&key(KeyCode::Down));
        }
        assert_eq!(field.highlighted(), Some(2));
        field.handle_key(&key(KeyCode::Up));
        field.handle_key(&key(KeyCode::Up));
        field.handle_key(&key(KeyCode::Up));
        assert_eq!(field.highlighted(), None);
        assert!(!field.handle_key(&key(KeyCode::Up)));
    }

    #[test]
    fn test_password_is_masked_without_options() {
        let parameter = Parameter {
            param_type: ParameterType::Password,
            values: vec!["ignored".into()],
            ..Parameter::new("TOKEN")
        };
        let field = Field::from_parameter(&parameter, "abc");
        assert_eq!(field.display_value(), "***");
        assert!(field.suggestions().is_empty());
    }

    #[test]
    fn test_path_field_completes_without_submitting() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("deploy.sh"), "").unwrap();
        let parameter = Parameter {
            param_type: ParameterType::Path,
            ..Parameter::new("FILE")
        };
        let prefix = format!("{}/dep", dir.path().display());
        let mut field = Field::from_parameter(&parameter, &prefix);
        assert_eq!(field.suggestions().len(), 1);
        field.handle_key(&key(KeyCode::Down));
        assert!(field.handle_key(&key(KeyCode::Enter)));
        assert_eq!(field.value(), format!("{}/deploy.sh", dir.path().display()));
    }
}
