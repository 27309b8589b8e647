//! Executors used by unit tests in place of real subprocesses.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::runner::{CommandExecutor, CommandResult};

/// Records every command it is asked to run.
#[derive(Default)]
pub(crate) struct RecordingExecutor {
    calls: Mutex<Vec<PathBuf>>,
    fail: bool,
    stop: Option<(usize, CancellationToken)>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Report every run as a non-zero exit.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Cancel `token` once `runs` commands have been recorded.
    pub(crate) fn stop_after(mut self, runs: usize, token: CancellationToken) -> Self {
        self.stop = Some((runs, token));
        self
    }

    pub(crate) fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, command: &Path) -> CommandResult {
        let total = match self.calls.lock() {
            Ok(mut calls) => {
                calls.push(command.to_path_buf());
                calls.len()
            }
            Err(_) => 0,
        };

        if let Some((runs, token)) = &self.stop {
            if total >= *runs {
                token.cancel();
            }
        }

        if self.fail {
            CommandResult::failure(Some(1), b"boom".to_vec(), Utc::now(), Duration::ZERO)
        } else {
            CommandResult::success(Vec::new(), Utc::now(), Duration::ZERO)
        }
    }
}
