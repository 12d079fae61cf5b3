// src/core/parameters.rs

use crate::models::{Parameter, ParameterType, ParameterValue};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A single hint line: `# ${VAR} Descriptor: value`.
    /// Exactly one space is expected between `#` and `${VAR}`; anything else is an ordinary comment.
    pub(crate) static ref HINT_RE: Regex = Regex::new(
        r"(?m)^# \$\{([A-Za-z_][A-Za-z0-9_]*)\} (Name|Description|Default|Type|Values):(.*)$"
    )
    .unwrap();
}

lazy_static! {
    /// Same grammar as `HINT_RE`, but also consumes the line terminator so matches can be deleted.
    pub(crate) static ref HINT_LINE_RE: Regex = Regex::new(
        r"(?m)^# \$\{[A-Za-z_][A-Za-z0-9_]*\} (?:Name|Description|Default|Type|Values):.*(?:\r?\n|$)"
    )
    .unwrap();
}

// --- DATA STRUCTS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Descriptor {
    Name,
    Description,
    Default,
    Type,
    Values,
}

impl Descriptor {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Name" => Some(Descriptor::Name),
            "Description" => Some(Descriptor::Description),
            "Default" => Some(Descriptor::Default),
            "Type" => Some(Descriptor::Type),
            "Values" => Some(Descriptor::Values),
            _ => None,
        }
    }
}

/// A parameter together with its anchor: the byte offset right after the last hint line
/// that mentions it. `Set` rendering inserts the assignment there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintedParameter {
    pub parameter: Parameter,
    pub anchor: usize,
}

// --- PARSER ---

/// Extracts all parameters declared in `snippet`, in first-occurrence order of their variable.
/// This never fails; a snippet without hints simply yields no parameters.
pub fn parse_parameters(snippet: &str) -> Vec<Parameter> {
    parse_hints(snippet)
        .into_iter()
        .map(|hinted| hinted.parameter)
        .collect()
}

/// Like `parse_parameters`, but also reports the anchor offset of every parameter.
pub fn parse_hints(snippet: &str) -> Vec<HintedParameter> {
    let mut result: Vec<HintedParameter> = Vec::new();
    let mut has_default: Vec<bool> = Vec::new();

    for caps in HINT_RE.captures_iter(snippet) {
        let (Some(whole), Some(key), Some(descriptor), Some(value)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let Some(descriptor) = Descriptor::parse(descriptor.as_str()) else {
            continue;
        };
        let key = key.as_str();
        let value = clean_value(value.as_str());
        let anchor = line_end(snippet, whole.end());

        let position = match result.iter().position(|h| h.parameter.key == key) {
            Some(position) => position,
            None => {
                result.push(HintedParameter {
                    parameter: Parameter::new(key),
                    anchor,
                });
                has_default.push(false);
                result.len() - 1
            }
        };
        let Some(hinted) = result.get_mut(position) else {
            continue;
        };
        hinted.anchor = hinted.anchor.max(anchor);

        let parameter = &mut hinted.parameter;
        match descriptor {
            Descriptor::Name => parameter.name = value.to_string(),
            Descriptor::Description => parameter.description = value.to_string(),
            Descriptor::Default => {
                parameter.default_value = value.to_string();
                if let Some(flag) = has_default.get_mut(position) {
                    *flag = true;
                }
            }
            Descriptor::Type => parameter.param_type = ParameterType::from_hint(value),
            Descriptor::Values => parameter.values.extend(split_values(value)),
        }
    }

    // A default outside the allowed values is still offered as the first choice.
    for (hinted, has_default) in result.iter_mut().zip(has_default) {
        let parameter = &mut hinted.parameter;
        if has_default
            && !parameter.values.is_empty()
            && !parameter.values.contains(&parameter.default_value)
        {
            log::debug!(
                "Default '{}' of parameter '{}' is not one of its values, adding it.",
                parameter.default_value,
                parameter.key
            );
            parameter.values.insert(0, parameter.default_value.clone());
        }
    }

    result
}

/// Splits a `Values:` hint on unescaped commas. `\,` yields a literal comma.
pub fn split_values(raw: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => {
                push_value(&mut values, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_value(&mut values, &current);
    values
}

fn push_value(values: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        values.push(trimmed.to_string());
    }
}

/// Removes the single separator space after the colon and a trailing carriage return.
fn clean_value(raw: &str) -> &str {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    raw.strip_prefix(' ').unwrap_or(raw)
}

/// Returns the offset just past the newline that terminates the line ending at `match_end`.
fn line_end(snippet: &str, match_end: usize) -> usize {
    match snippet.get(match_end..) {
        Some(rest) if rest.starts_with("\r\n") => match_end + 2,
        Some(rest) if rest.starts_with('\n') => match_end + 1,
        _ => match_end,
    }
}

// --- VALUE MERGING ---

/// Builds the initial form values: each parameter's default, overridden by any matching
/// out-of-band value. Overrides for unknown keys are ignored with a debug log.
pub fn initial_values(parameters: &[Parameter], overrides: &[ParameterValue]) -> Vec<String> {
    for value in overrides {
        if !parameters.iter().any(|p| p.key == value.key) {
            log::debug!("Ignoring override for unknown parameter '{}'.", value.key);
        }
    }
    parameters
        .iter()
        .map(|parameter| {
            overrides
                .iter()
                .rev()
                .find(|v| v.key == parameter.key)
                .map(|v| v.value.clone())
                .unwrap_or_else(|| parameter.default_value.clone())
        })
        .collect()
}

/// True when every parameter received an out-of-band value, so no form is needed.
pub fn all_overridden(parameters: &[Parameter], overrides: &[ParameterValue]) -> bool {
    parameters
        .iter()
        .all(|p| overrides.iter().any(|v| v.key == p.key))
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNIPPET: &str = "# ${VAR} Name: Msg\n# ${VAR} Description: what to print\necho \"${VAR}\"\n";

    #[test]
    fn test_parse_name_and_description() {
        let params = parse_parameters(SNIPPET);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].key, "VAR");
        assert_eq!(params[0].name, "Msg");
        assert_eq!(params[0].description, "what to print");
        assert_eq!(params[0].param_type, ParameterType::Value);
    }

    #[test]
    fn test_name_defaults_to_key() {
        let params = parse_parameters("# ${HOST} Description: target host\nssh ${HOST}\n");
        assert_eq!(params[0].name, "HOST");
    }

    #[test]
    fn test_first_occurrence_order() {
        let snippet = "# ${B} Name: b\n# ${A} Name: a\n# ${B} Default: x\n# ${C} Name: c\n";
        let keys: Vec<_> = parse_parameters(snippet).into_iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_later_scalar_wins() {
        let snippet = "# ${A} Default: one\n# ${A} Default: two\n";
        assert_eq!(parse_parameters(snippet)[0].default_value, "two");
    }

    #[test]
    fn test_values_with_escape_and_append() {
        let snippet = "# ${MODE} Values: dev,staging\n# ${MODE} Values: a\\,b, prod\n";
        let params = parse_parameters(snippet);
        assert_eq!(params[0].values, vec!["dev", "staging", "a,b", "prod"]);
    }

    #[test]
    fn test_type_parsing_and_unknown_type() {
        let snippet = "# ${P} Type: PATH\n# ${S} Type: PASSWORD\n# ${X} Type: NUMBER\n";
        let params = parse_parameters(snippet);
        assert_eq!(params[0].param_type, ParameterType::Path);
        assert_eq!(params[1].param_type, ParameterType::Password);
        assert_eq!(params[2].param_type, ParameterType::Value);
    }

    #[test]
    fn test_non_hint_lines_are_ignored() {
        let snippet = "#  ${A} Name: two spaces\n#\t${B} Name: tab\n# ${C} Colour: red\n# plain comment\n";
        assert!(parse_parameters(snippet).is_empty());
    }

    #[test]
    fn test_anchor_is_end_of_last_hint_line() {
        let snippet = "# ${A} Name: a\necho\n# ${A} Default: x\necho ${A}\n";
        let hints = parse_hints(snippet);
        let expected = snippet.find("echo ${A}").unwrap();
        assert_eq!(hints[0].anchor, expected);
    }

    #[test]
    fn test_anchor_without_trailing_newline() {
        let snippet = "# ${A} Name: a";
        assert_eq!(parse_hints(snippet)[0].anchor, snippet.len());
    }

    #[test]
    fn test_default_outside_values_is_offered() {
        let snippet = "# ${M} Values: a,b\n# ${M} Default: c\n";
        let params = parse_parameters(snippet);
        assert_eq!(params[0].values, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let snippet = "# ${A} Default: x\r\necho ${A}\r\n";
        let hints = parse_hints(snippet);
        assert_eq!(hints[0].parameter.default_value, "x");
        assert_eq!(hints[0].anchor, "# ${A} Default: x\r\n".len());
    }

    #[test]
    fn test_initial_values_merge_overrides() {
        let params = parse_parameters("# ${A} Default: x\n# ${B} Default: y\n");
        let overrides = vec![ParameterValue {
            key: "B".into(),
            value: "z".into(),
        }];
        assert_eq!(initial_values(&params, &overrides), vec!["x", "z"]);
        assert!(!all_overridden(&params, &overrides));
    }
}
