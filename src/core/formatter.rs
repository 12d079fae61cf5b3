// src/core/formatter.rs

use crate::core::parameters::{HINT_LINE_RE, HintedParameter, parse_hints};
use crate::models::{ParamMode, SnippetFormatOptions};

/// Reassembles `snippet` with the supplied parameter values.
///
/// `values` must hold exactly one entry per declared parameter, in declaration order.
/// On a count mismatch the snippet is returned unchanged; no partial rendering happens.
/// Empty values fall back to the parameter's default.
pub fn format_snippet(snippet: &str, values: &[String], options: &SnippetFormatOptions) -> String {
    let hints = parse_hints(snippet);
    if hints.len() != values.len() {
        log::trace!(
            "Parameter count mismatch ({} declared, {} supplied), leaving snippet untouched.",
            hints.len(),
            values.len()
        );
        return snippet.to_string();
    }

    match options.param_mode {
        ParamMode::Replace => render_replace(snippet, &hints, values),
        ParamMode::Set => render_set(snippet, &hints, values, options.remove_comments),
    }
}

/// Deletes every hint line, declared or not.
pub fn strip_hint_lines(snippet: &str) -> String {
    HINT_LINE_RE.replace_all(snippet, "").into_owned()
}

fn effective_value<'a>(hinted: &'a HintedParameter, value: &'a str) -> &'a str {
    if value.is_empty() {
        &hinted.parameter.default_value
    } else {
        value
    }
}

fn render_replace(snippet: &str, hints: &[HintedParameter], values: &[String]) -> String {
    let mut result = strip_hint_lines(snippet);
    for (hinted, value) in hints.iter().zip(values) {
        let placeholder = format!("${{{}}}", hinted.parameter.key);
        result = result.replace(&placeholder, effective_value(hinted, value));
    }
    result
}

fn render_set(
    snippet: &str,
    hints: &[HintedParameter],
    values: &[String],
    remove_comments: bool,
) -> String {
    // Insert from the highest anchor down so earlier offsets stay valid.
    let mut insertions: Vec<(usize, String)> = hints
        .iter()
        .zip(values)
        .map(|(hinted, value)| {
            let assignment = format!(
                "{}=\"{}\"\n",
                hinted.parameter.key,
                effective_value(hinted, value)
            );
            (hinted.anchor, assignment)
        })
        .collect();
    insertions.sort_by(|a, b| b.0.cmp(&a.0));

    let mut result = snippet.to_string();
    for (anchor, assignment) in insertions {
        let anchor = anchor.min(result.len());
        // A hint on the last line without a newline needs one before the assignment.
        let needs_newline = anchor > 0
            && result
                .get(..anchor)
                .is_some_and(|head| !head.ends_with('\n'));
        if needs_newline {
            result.insert(anchor, '\n');
            result.insert_str(anchor + 1, &assignment);
        } else {
            result.insert_str(anchor, &assignment);
        }
    }

    if remove_comments {
        strip_hint_lines(&result)
    } else {
        result
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNIPPET: &str = "# ${VAR} Name: Msg\n# ${VAR} Description: what to print\necho \"${VAR}\"\n";

    fn opts(param_mode: ParamMode, remove_comments: bool) -> SnippetFormatOptions {
        SnippetFormatOptions {
            param_mode,
            remove_comments,
        }
    }

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replace_rendering() {
        let out = format_snippet(SNIPPET, &values(&["hello"]), &opts(ParamMode::Replace, false));
        assert_eq!(out, "echo \"hello\"\n");
    }

    #[test]
    fn test_set_rendering_preserves_comments() {
        let out = format_snippet(SNIPPET, &values(&["hello"]), &opts(ParamMode::Set, false));
        assert_eq!(
            out,
            "# ${VAR} Name: Msg\n# ${VAR} Description: what to print\nVAR=\"hello\"\necho \"${VAR}\"\n"
        );
    }

    #[test]
    fn test_set_rendering_removes_comments() {
        let out = format_snippet(SNIPPET, &values(&["hello"]), &opts(ParamMode::Set, true));
        assert_eq!(out, "VAR=\"hello\"\necho \"${VAR}\"\n");
    }

    #[test]
    fn test_default_fallback() {
        let snippet = "# ${VAR} Default: world\necho \"${VAR}\"\n";
        let out = format_snippet(snippet, &values(&[""]), &opts(ParamMode::Replace, false));
        assert_eq!(out, "echo \"world\"\n");
    }

    #[test]
    fn test_enum_value_substitution() {
        let snippet = "# ${MODE} Values: dev,staging,prod\ndeploy --env ${MODE}\n";
        let out = format_snippet(snippet, &values(&["staging"]), &opts(ParamMode::Replace, false));
        assert_eq!(out, "deploy --env staging\n");
    }

    #[test]
    fn test_mismatch_returns_original() {
        let out = format_snippet(SNIPPET, &values(&["a", "b"]), &opts(ParamMode::Replace, false));
        assert_eq!(out, SNIPPET);
    }

    #[test]
    fn test_replace_removes_undeclared_hint_lines_too() {
        // Every hint line goes, even one for a variable whose only hint is a Name.
        let snippet = "# ${A} Name: a\n# ${B} Name: b\necho ${A} ${B}\n";
        let out = format_snippet(snippet, &values(&["1", "2"]), &opts(ParamMode::Replace, false));
        assert!(!out.contains("# ${"));
        assert_eq!(out, "echo 1 2\n");
    }

    #[test]
    fn test_set_assignment_between_hint_groups() {
        let snippet = "# ${A} Name: a\n# ${B} Name: b\n# ${A} Default: x\necho ${A} ${B}\n";
        let out = format_snippet(snippet, &values(&["1", "2"]), &opts(ParamMode::Set, false));
        assert_eq!(
            out,
            "# ${A} Name: a\n# ${B} Name: b\nB=\"2\"\n# ${A} Default: x\nA=\"1\"\necho ${A} ${B}\n"
        );
    }

    #[test]
    fn test_set_on_last_line_without_newline() {
        let snippet = "echo ${A}\n# ${A} Name: a";
        let out = format_snippet(snippet, &values(&["1"]), &opts(ParamMode::Set, false));
        assert_eq!(out, "echo ${A}\n# ${A} Name: a\nA=\"1\"\n");
    }

    #[test]
    fn test_no_parameters_is_identity() {
        let snippet = "ls -la\n";
        assert_eq!(format_snippet(snippet, &[], &opts(ParamMode::Set, true)), snippet);
        assert_eq!(format_snippet(snippet, &[], &opts(ParamMode::Replace, false)), snippet);
    }
}
