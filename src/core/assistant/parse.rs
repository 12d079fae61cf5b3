// src/core/assistant/parse.rs

use crate::core::snippet::{parse_title_header, remove_lines};
use crate::models::ParsedScript;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A fenced shell block: ```bash, ```sh, ```shell or ```zsh.
    static ref FENCED_BLOCK_RE: Regex =
        Regex::new(r"(?s)```(?:bash|sh|shell|zsh)[ \t]*\r?\n(.*?)```").unwrap();
}

/// Extracts the script from a model answer.
///
/// The first fenced shell block wins; without one the whole answer is the script. A title
/// header at the top provides the title, and its `Filename:` line (if any) the filename;
/// that line is dropped from the stored contents.
pub fn parse_response(response: &str) -> ParsedScript {
    let body = FENCED_BLOCK_RE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| response.trim().to_string());
    let mut contents = if body.ends_with('\n') || body.is_empty() {
        body
    } else {
        format!("{}\n", body)
    };

    let Some(header) = parse_title_header(&contents) else {
        return ParsedScript {
            contents,
            title: None,
            filename: None,
        };
    };

    let filename = header
        .field("filename")
        .filter(|f| !f.is_empty())
        .map(str::to_string);
    if filename.is_some() {
        let filename_line = contents
            .lines()
            .enumerate()
            .skip(header.first_line + 2)
            .take(header.end_line.saturating_sub(header.first_line + 3))
            .find(|(_, line)| is_filename_line(line))
            .map(|(index, _)| index);
        if let Some(index) = filename_line {
            contents = remove_lines(&contents, index, index + 1);
        }
    }

    ParsedScript {
        contents,
        title: Some(header.title),
        filename,
    }
}

fn is_filename_line(line: &str) -> bool {
    line.strip_prefix('#')
        .map(str::trim_start)
        .and_then(|rest| rest.get(..9))
        .is_some_and(|key| key.eq_ignore_ascii_case("filename:"))
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fenced_block_is_extracted() {
        let response = "Here you go:\n\n```bash\necho hello\n```\n\nEnjoy!";
        let parsed = parse_response(response);
        assert_eq!(parsed.contents, "echo hello\n");
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.filename, None);
    }

    #[test]
    fn test_plain_answer_is_trimmed() {
        let parsed = parse_response("\n  ls -la  \n\n");
        assert_eq!(parsed.contents, "ls -la\n");
    }

    #[test]
    fn test_header_with_filename() {
        let response = "```sh\n#!/bin/bash\n#\n# Clean docker\n# Filename: docker-clean.sh\n#\ndocker system prune -f\n```";
        let parsed = parse_response(response);
        assert_eq!(parsed.title.as_deref(), Some("Clean docker"));
        assert_eq!(parsed.filename.as_deref(), Some("docker-clean.sh"));
        assert_eq!(
            parsed.contents,
            "#!/bin/bash\n#\n# Clean docker\n#\ndocker system prune -f\n"
        );
    }

    #[test]
    fn test_header_without_filename_keeps_contents() {
        let response = "```bash\n#\n# Disk usage\n#\ndu -sh .\n```";
        let parsed = parse_response(response);
        assert_eq!(parsed.title.as_deref(), Some("Disk usage"));
        assert_eq!(parsed.filename, None);
        assert_eq!(parsed.contents, "#\n# Disk usage\n#\ndu -sh .\n");
    }

    #[test]
    fn test_other_languages_are_not_shell_blocks() {
        let response = "```python\nprint(1)\n```";
        assert_eq!(parse_response(response).contents, response.to_string() + "\n");
    }
}
