//! Command execution.
//!
//! The `CommandRunner` spawns a configured command, captures its combined
//! output and reports timing. Failures are logged and returned as data; they
//! never stop the caller.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{error, info, warn};

/// Something that can run a bound command.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion.
    async fn execute(&self, command: &Path) -> CommandResult;
}

/// Result of a single command run.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command launched and exited with status zero.
    pub success: bool,

    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,

    /// Standard output followed by standard error.
    pub output: Vec<u8>,

    /// Wall-clock start time.
    pub started_at: DateTime<Utc>,

    /// Elapsed time.
    pub duration: Duration,

    /// Failure signal found in JSON output, if any. Advisory only.
    pub structured_error: Option<StructuredCommandError>,

    /// Why the command could not be started.
    pub launch_error: Option<String>,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success(output: Vec<u8>, started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            output,
            started_at,
            duration,
            structured_error: None,
            launch_error: None,
        }
    }

    /// Create a result for a command that ran and exited unsuccessfully.
    pub fn failure(
        exit_code: Option<i32>,
        output: Vec<u8>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            exit_code,
            output,
            started_at,
            duration,
            structured_error: None,
            launch_error: None,
        }
    }

    /// Create a result for a command that could not be started.
    pub fn launch_failure(
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            exit_code: None,
            output: Vec::new(),
            started_at,
            duration,
            structured_error: None,
            launch_error: Some(error.into()),
        }
    }

    /// Captured output as text.
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// A failure signal embedded in a command's JSON output.
///
/// Recognised shapes:
///
/// ```text
/// {"success":false,"msg":"call had an error","path":"/admin/job/minPage"}
/// {"error":"call had an error","path":"/admin/job/minPage"}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredCommandError {
    /// The `success` field, when present.
    pub success: Option<bool>,

    /// The `error` field, when present and non-empty.
    pub error: Option<serde_json::Value>,

    /// The `msg` field, when present.
    pub message: Option<String>,
}

impl StructuredCommandError {
    /// Look for a failure signal in `output`.
    ///
    /// Output that is not a JSON object is the normal case and yields `None`.
    /// Only `success` and `error` decide; other fields may have any shape.
    pub fn detect(output: &[u8]) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_slice(output).ok()?;
        let object = value.as_object()?;

        let success = object.get("success").and_then(serde_json::Value::as_bool);
        let error = object.get("error").filter(|value| match value {
            serde_json::Value::Null => false,
            serde_json::Value::String(s) => !s.is_empty(),
            _ => true,
        });

        if success == Some(false) || error.is_some() {
            Some(Self {
                success,
                error: error.cloned(),
                message: object
                    .get("msg")
                    .and_then(serde_json::Value::as_str)
                    .map(String::from),
            })
        } else {
            None
        }
    }
}

/// Runs commands as subprocesses.
///
/// The command is executed directly with no arguments and no shell; commands
/// that need arguments must be wrapped in a script.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    print_stdout: bool,
}

impl CommandRunner {
    /// Create a new command runner.
    pub fn new() -> Self {
        Self { print_stdout: true }
    }

    /// Set whether the output of successful runs is logged.
    pub fn with_print_stdout(mut self, print_stdout: bool) -> Self {
        self.print_stdout = print_stdout;
        self
    }

    /// Run `command` and capture its output.
    pub async fn run(&self, command: &Path) -> CommandResult {
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Start run {command:?} at {}", started_at.to_rfc3339());

        let mut result = match Command::new(command).output().await {
            Ok(output) => {
                let mut combined = output.stdout;
                combined.extend_from_slice(&output.stderr);

                if output.status.success() {
                    CommandResult::success(combined, started_at, start.elapsed())
                } else {
                    CommandResult::failure(
                        output.status.code(),
                        combined,
                        started_at,
                        start.elapsed(),
                    )
                }
            }
            Err(e) => CommandResult::launch_failure(e.to_string(), started_at, start.elapsed()),
        };

        if let Some(ref launch_error) = result.launch_error {
            error!("watchmod error: {launch_error}; On cmd: {}", command.display());
        } else if !result.success {
            error!(
                "watchmod error: exit status {:?}; On cmd: {}; Output:\n{}",
                result.exit_code,
                command.display(),
                result.output_lossy()
            );
        } else if self.print_stdout && !result.output.is_empty() {
            info!("{}", result.output_lossy());
        }

        result.structured_error = StructuredCommandError::detect(&result.output);
        if let Some(ref structured) = result.structured_error {
            warn!(
                "watchmod command error: {} reported {:?}\n{}",
                command.display(),
                structured,
                result.output_lossy()
            );
        }

        info!("End   run {command:?} in {:?}", result.duration);
        result
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for CommandRunner {
    async fn execute(&self, command: &Path) -> CommandResult {
        self.run(command).await
    }
}
