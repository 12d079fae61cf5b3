// src/system/editor.rs

use std::path::Path;
use std::process::Command as StdCommand;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Editor command '{0}' could not be parsed.")]
    CommandParse(String),
    #[error("No editor configured. Set `editor` in the config or $EDITOR.")]
    NoEditor,
    #[error("Editor '{0}' could not be started: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("Editor '{0}' exited with status {1}.")]
    Failed(String, String),
}

/// Opens `file` in `editor` and waits for it to exit. The editor string may carry
/// arguments (`code --wait`), which are split with shell quoting rules.
pub fn open_in_editor(editor: &str, file: &Path) -> Result<(), EditorError> {
    let parts = shlex::split(editor.trim()).ok_or_else(|| EditorError::CommandParse(editor.to_string()))?;
    let Some((program, args)) = parts.split_first() else {
        return Err(EditorError::NoEditor);
    };

    log::debug!("Opening '{}' with '{}'", file.display(), editor);
    let status = StdCommand::new(program)
        .args(args)
        .arg(dunce::simplified(file))
        .status()
        .map_err(|e| EditorError::Spawn(editor.to_string(), e))?;
    if !status.success() {
        return Err(EditorError::Failed(editor.to_string(), status.to_string()));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_editor_runs_with_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("script.sh");
        fs::write(&file, "echo a\n").unwrap();
        // The file path arrives as `$0` of the inline script.
        open_in_editor(r#"sh -c 'echo "echo b" > "$0"'"#, &file).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "echo b\n");
    }

    #[test]
    fn test_editor_errors() {
        let file = Path::new("/tmp/unused");
        assert!(matches!(open_in_editor("", file), Err(EditorError::NoEditor)));
        assert!(matches!(open_in_editor("\"unterminated", file), Err(EditorError::CommandParse(_))));
        assert!(matches!(open_in_editor("false", file), Err(EditorError::Failed(..))));
    }
}
