// src/ui/form/completion.rs

use std::fs;
use std::ops::Range;

const MAX_SUGGESTIONS: usize = 50;

/// Filesystem suggestions for a partially typed path.
///
/// The directory portion of `input` (up to the last `/`) is listed, and every entry whose
/// full path starts with `input` is returned, directories with a trailing `/`. A leading
/// `~` is expanded for the lookup but kept in the suggestions.
pub fn complete_path(input: &str) -> Vec<String> {
    let (dir_part, name_part) = match input.rfind('/') {
        Some(i) => input.split_at(i + 1),
        None => ("", input),
    };
    let lookup = if dir_part.is_empty() {
        ".".to_string()
    } else {
        shellexpand::tilde(dir_part).into_owned()
    };

    let Ok(entries) = fs::read_dir(&lookup) else {
        log::trace!("No completion for '{}': cannot list '{}'", input, lookup);
        return Vec::new();
    };

    let show_hidden = name_part.starts_with('.');
    let mut suggestions: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') && !show_hidden {
                return None;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let candidate = format!("{}{}{}", dir_part, name, if is_dir { "/" } else { "" });
            candidate.starts_with(input).then_some(candidate)
        })
        .collect();
    suggestions.sort();
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// Case-insensitive substring filter over `options`.
/// Returns `(index, matched byte range)` pairs; an empty query matches everything with no range.
pub fn filter_options(options: &[String], query: &str) -> Vec<(usize, Option<Range<usize>>)> {
    if query.is_empty() {
        return (0..options.len()).map(|i| (i, None)).collect();
    }
    let needle = query.to_lowercase();
    options
        .iter()
        .enumerate()
        .filter_map(|(i, option)| find_case_insensitive(option, &needle).map(|range| (i, Some(range))))
        .collect()
}

/// Finds `needle` (already lowercased) in `haystack`, returning the byte range in `haystack`.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let starts = haystack.char_indices().map(|(i, _)| i);
    for start in starts {
        let Some(rest) = haystack.get(start..) else {
            continue;
        };
        let mut matched_len = 0;
        let mut lowered = String::new();
        for c in rest.chars() {
            if lowered.len() >= needle.len() {
                break;
            }
            lowered.extend(c.to_lowercase());
            matched_len += c.len_utf8();
        }
        if lowered == needle {
            return Some(start..start + matched_len);
        }
    }
    None
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_complete_path_lists_matching_entries() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("scripts")).unwrap();
        fs::write(dir.path().join("setup.sh"), "").unwrap();
        fs::write(dir.path().join("other.txt"), "").unwrap();
        fs::write(dir.path().join(".secret"), "").unwrap();
        let base = format!("{}/", dir.path().display());

        let all = complete_path(&base);
        assert_eq!(
            all,
            vec![format!("{}other.txt", base), format!("{}scripts/", base), format!("{}setup.sh", base)]
        );

        let s = complete_path(&format!("{}s", base));
        assert_eq!(s, vec![format!("{}scripts/", base), format!("{}setup.sh", base)]);

        let hidden = complete_path(&format!("{}.", base));
        assert_eq!(hidden, vec![format!("{}.secret", base)]);
    }

    #[test]
    fn test_complete_path_on_missing_directory() {
        assert!(complete_path("/definitely/not/here/x").is_empty());
    }

    #[test]
    fn test_filter_options() {
        let options: Vec<String> = ["dev", "staging", "prod", "Production"].iter().map(|s| s.to_string()).collect();
        assert_eq!(filter_options(&options, "").len(), 4);
        assert_eq!(
            filter_options(&options, "PROD"),
            vec![(2, Some(0..4)), (3, Some(0..4))]
        );
        assert_eq!(filter_options(&options, "ag"), vec![(1, Some(2..4))]);
        assert!(filter_options(&options, "qa").is_empty());
    }
}
