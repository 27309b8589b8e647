//! Turns a configuration into a running set of watchers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::WatchConfig;
use crate::error::{Result, WatcherError};
use crate::filter::ExclusionFilter;
use crate::paths::WatchTarget;
use crate::runner::{CommandExecutor, CommandRunner};
use crate::watcher::DirectoryWatcher;

/// Whether watchers keep running after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Watch every directory until cancelled.
    Daemon,

    /// Run every command once and return.
    OneShot,
}

impl RunMode {
    /// Map the `--daemon` flag onto a mode.
    pub fn from_daemon_flag(daemon: bool) -> Self {
        if daemon { Self::Daemon } else { Self::OneShot }
    }
}

/// Summary of a completed [`Orchestrator::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    /// The mode that ran.
    pub mode: RunMode,

    /// Number of configured targets.
    pub targets: usize,

    /// Commands executed before watching began.
    pub startup_runs: usize,
}

/// Owns the resolved targets and the shared filter, and drives the watchers.
pub struct Orchestrator {
    targets: Vec<WatchTarget>,
    filter: Arc<ExclusionFilter>,
    executor: Arc<dyn CommandExecutor>,
    run_on_start: bool,
    debounce: Option<Duration>,
}

impl Orchestrator {
    /// Build an orchestrator that runs commands as subprocesses.
    pub fn new(config: &WatchConfig) -> Result<Self> {
        let runner = CommandRunner::new().with_print_stdout(config.print_stdout);
        Self::with_executor(config, Arc::new(runner))
    }

    /// Build an orchestrator around a custom executor.
    ///
    /// Every directory and command is expanded and made absolute, and the
    /// exclusion filter is compiled once here.
    pub fn with_executor(config: &WatchConfig, executor: Arc<dyn CommandExecutor>) -> Result<Self> {
        let filter = ExclusionFilter::new(
            config.exclude_file_names.iter().cloned(),
            &config.exclude_strings,
        )?;
        info!("Exclude files: {:?}", filter.file_names());
        info!("Exclude strings: {:?}", config.exclude_strings);

        let targets = config
            .watch_targets
            .iter()
            .map(|(dir, cmd)| WatchTarget::resolve(dir, cmd))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            targets,
            filter: Arc::new(filter),
            executor,
            run_on_start: config.run_on_start,
            debounce: config.debounce(),
        })
    }

    /// Resolved targets.
    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    /// The shared exclusion filter.
    pub fn filter(&self) -> &ExclusionFilter {
        &self.filter
    }

    /// Run the configuration.
    ///
    /// In [`RunMode::OneShot`] every command runs once and this returns. In
    /// [`RunMode::Daemon`] this returns only after `cancel` fires or a
    /// watcher fails; the first failure stops the remaining watchers and is
    /// returned.
    pub async fn start(&self, mode: RunMode, cancel: CancellationToken) -> Result<StartReport> {
        let run_on_start = match mode {
            RunMode::OneShot => {
                info!("Flag `daemon` set to false. Running commands in config and exiting.");
                true
            }
            RunMode::Daemon => self.run_on_start,
        };

        let mut startup_runs = 0;
        if run_on_start {
            for target in &self.targets {
                self.executor.execute(&target.command).await;
                startup_runs += 1;
            }
        }

        let report = StartReport {
            mode,
            targets: self.targets.len(),
            startup_runs,
        };

        if mode == RunMode::OneShot {
            return Ok(report);
        }

        self.watch(cancel).await?;
        Ok(report)
    }

    async fn watch(&self, cancel: CancellationToken) -> Result<()> {
        if self.targets.is_empty() {
            warn!("No directories configured; waiting for shutdown");
            cancel.cancelled().await;
            return Ok(());
        }

        let shutdown = cancel.child_token();
        let mut tasks = JoinSet::new();
        for target in &self.targets {
            let watcher =
                DirectoryWatcher::new(target.clone(), self.filter.clone(), self.executor.clone())
                    .with_debounce(self.debounce);
            tasks.spawn(watcher.run(shutdown.child_token()));
        }

        let mut failure: Option<WatcherError> = None;
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(WatcherError::Task(e)),
            };

            if let Err(e) = result {
                error!("Watcher failed: {e}");
                if failure.is_none() {
                    shutdown.cancel();
                    failure = Some(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
