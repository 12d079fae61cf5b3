// src/system/executor.rs

use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command as StdCommand, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Shell command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No shell configured to run the script.")]
    EmptyCommand,
    #[error("Shell '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] std::io::Error),
}

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// The script shares the terminal with us.
    Inherit,
    /// Stdin is closed; stdout and stderr are collected line by line.
    Capture,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Merged stdout and stderr in arrival order. Empty in `Inherit` mode.
    pub output: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub started_at: DateTime<Local>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs `script` as `<shell> -c <script>`. `shell` may carry its own arguments
/// (e.g. `bash --noprofile`), split with shell quoting rules.
///
/// A non-zero exit is not an error: it is reported in the result.
pub fn execute_script(shell: &str, script: &str, mode: OutputMode) -> Result<ExecutionResult, ExecutionError> {
    let parts = shlex::split(shell.trim()).ok_or_else(|| ExecutionError::CommandParse(shell.to_string()))?;
    let Some((program, shell_args)) = parts.split_first() else {
        return Err(ExecutionError::EmptyCommand);
    };

    let mut command = StdCommand::new(program);
    command.args(shell_args).arg("-c").arg(script);
    match mode {
        OutputMode::Inherit => {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        OutputMode::Capture => {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }
    }

    log::debug!("Running script with '{}' ({:?})", shell, mode);
    let started_at = Local::now();
    let start = Instant::now();
    let mut child = command
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(shell.to_string(), e))?;

    // 1. Drain both pipes on their own threads so neither can fill up and block the child.
    let (lines_tx, lines_rx) = crossbeam_channel::unbounded::<String>();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(stdout, lines_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(stderr, lines_tx.clone()));
    }
    drop(lines_tx);

    // 2. The channel closes once both readers hit EOF.
    let output: String = lines_rx.iter().collect();
    for reader in readers {
        if reader.join().is_err() {
            log::warn!("An output reader thread panicked");
        }
    }

    // 3. Reap the child.
    let status = child
        .wait()
        .map_err(|e| ExecutionError::CommandFailed(shell.to_string(), e))?;
    let duration = start.elapsed();
    log::debug!("Script finished with {:?} after {:?}", status.code(), duration);

    Ok(ExecutionResult {
        output,
        exit_code: status.code(),
        duration,
        started_at,
    })
}

fn spawn_line_reader<R: Read + Send + 'static>(stream: R, lines: Sender<String>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {
                    let mut line = String::from_utf8_lossy(&buffer).into_owned();
                    if !line.ends_with('\n') {
                        line.push('\n');
                    }
                    if lines.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read script output: {}", e);
                    break;
                }
            }
        }
    })
}

// MARK: --- UNIT TESTS ---

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capture_collects_stdout_and_stderr() {
        let result = execute_script("/bin/sh", "echo out; echo err 1>&2", OutputMode::Capture).unwrap();
        assert!(result.success());
        let mut lines: Vec<&str> = result.output.lines().collect();
        lines.sort();
        assert_eq!(lines, vec!["err", "out"]);
    }

    #[test]
    fn test_non_zero_exit_is_reported_not_raised() {
        let result = execute_script("/bin/sh", "echo partial\nexit 3", OutputMode::Capture).unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.success());
        assert_eq!(result.output, "partial\n");
    }

    #[test]
    fn test_missing_trailing_newline_is_completed() {
        let result = execute_script("/bin/sh", "printf 'no newline'", OutputMode::Capture).unwrap();
        assert_eq!(result.output, "no newline\n");
    }

    #[test]
    fn test_stdin_is_closed_in_capture_mode() {
        let result = execute_script("/bin/sh", "cat; echo done", OutputMode::Capture).unwrap();
        assert_eq!(result.output, "done\n");
    }

    #[test]
    fn test_shell_with_arguments_and_errors() {
        let result = execute_script("/bin/sh -e", "false; echo unreachable", OutputMode::Capture).unwrap();
        assert_eq!(result.output, "");
        assert!(matches!(execute_script("  ", "true", OutputMode::Capture), Err(ExecutionError::EmptyCommand)));
        assert!(matches!(
            execute_script("/definitely/not/a/shell", "true", OutputMode::Capture),
            Err(ExecutionError::CommandFailed(..))
        ));
    }
}
