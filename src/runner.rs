//! Single-case execution: command rendering, the optional executable gate,
//! synchronous shell invocation, and verdict construction.
//!
//! Execution is deliberately blocking with no timeout: one subprocess runs to
//! completion before the next case starts, and a hung command hangs the run.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use crate::gate;
use crate::loader::CaseEntry;
use crate::normalize::Normalizer;
use crate::template;

/// The run's configuration, built once and threaded through every call.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Value substituted for the `{command}` placeholder.
    pub command: Option<String>,
    /// When set, arms the executable gate with this allowed base directory.
    pub check_path: Option<PathBuf>,
    /// Suppress PASS lines.
    pub quiet: bool,
}

/// Outcome of one executed test case.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub name: String,
    pub passed: bool,
    /// Actual stdout (post-normalization), or a status/error marker.
    pub actual: String,
    /// Expected stdout (post-normalization), or a status marker.
    pub expected: String,
    /// Captured stderr, shown on failure when non-empty.
    pub stderr: String,
}

impl Verdict {
    fn failed(name: &str, actual: String, expected: String, stderr: String) -> Self {
        Verdict { name: name.to_string(), passed: false, actual, expected, stderr }
    }
}

/// Execute one test case and produce its verdict. Execution-time problems
/// (bad template values, gate rejection, spawn failure) become failing
/// verdicts; nothing here aborts the run.
pub fn run_case(entry: &CaseEntry, options: &RunOptions) -> Verdict {
    let case = &entry.case;

    let command = match template::render(&case.command, options.command.as_deref(), entry.index) {
        Ok(command) => command,
        Err(err) => {
            return Verdict::failed(
                &case.name,
                format!("COMMAND ERROR: {err}"),
                case.expected_output.clone(),
                String::new(),
            );
        }
    };

    let normalizer = Normalizer::from_key(
        case.normalize
            .as_deref()
            .or(entry.default_normalize.as_deref()),
    );

    // The gate must run before anything is spawned.
    if let Some(base) = &options.check_path {
        if let Err(err) = gate::validate(&command, Some(base)) {
            return Verdict::failed(
                &case.name,
                format!("COMMAND ERROR: {err}"),
                case.expected_output.clone(),
                String::new(),
            );
        }
    }

    let output = match run_shell(&command, &case.input) {
        Ok(output) => output,
        Err(err) => {
            return Verdict::failed(
                &case.name,
                format!("COMMAND ERROR: {err}"),
                case.expected_output.clone(),
                String::new(),
            );
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let exit_code = output.status.code().unwrap_or(-1);

    // Output from a process that exited wrong is not worth diffing.
    if exit_code != case.expected_exit_status {
        return Verdict::failed(
            &case.name,
            format!("EXIT STATUS {exit_code}"),
            format!("EXPECTED STATUS {}", case.expected_exit_status),
            stderr,
        );
    }

    let actual = normalizer.apply(&String::from_utf8_lossy(&output.stdout));
    let expected = normalizer.apply(&case.expected_output);
    let passed = actual.trim() == expected.trim();

    Verdict { name: case.name.clone(), passed, actual, expected, stderr }
}

/// Run `command` through the platform shell with `input` on stdin, capturing
/// stdout, stderr and the exit status. Pipes are scoped to this call and
/// closed once the wait completes.
fn run_shell(command: &str, input: &str) -> std::io::Result<Output> {
    let mut child = shell_command(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        // A child that exits without reading breaks the pipe; that is its
        // business, not a runner error.
        let _ = stdin.write_all(input.as_bytes());
    }

    child.wait_with_output()
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
