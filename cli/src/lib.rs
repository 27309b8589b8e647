//! Command-line entry point for `watchmod`.
//!
//! ```text
//! watchmod --config=watchmod.json5 --daemon=false
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use watchmod_directory_watcher::{Orchestrator, RunMode, WatchConfig};

/// Run a command whenever a watched directory changes.
#[derive(Debug, Parser)]
#[command(name = "watchmod", version)]
pub struct Cli {
    /// Path for the watchmod config. Environment variables are expanded.
    #[arg(long, default_value = "watchmod.json5")]
    pub config: PathBuf,

    /// Run as daemon. If false, runs every command once and exits.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub daemon: bool,

    /// Log the output of successful commands. Overrides `printStdout` from
    /// the config file.
    #[arg(long, action = ArgAction::Set)]
    pub print_stdout: Option<bool>,
}

impl Cli {
    /// Load the config file and apply flag overrides.
    pub fn load_config(&self) -> Result<WatchConfig> {
        let mut config = WatchConfig::load(&self.config)
            .with_context(|| format!("failed to load config {}", self.config.display()))?;
        if let Some(print_stdout) = self.print_stdout {
            config.print_stdout = print_stdout;
        }
        Ok(config)
    }

    /// The run mode selected by `--daemon`.
    pub fn mode(&self) -> RunMode {
        RunMode::from_daemon_flag(self.daemon)
    }
}

/// Install the fmt subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
    {
        warn!("Tracing already initialised, skipping duplicate subscriber registration: {err}");
    }
}

/// Load the configuration and run it until completion or Ctrl-C.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let orchestrator = Orchestrator::new(&config).context("invalid configuration")?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            signal_cancel.cancel();
        }
    });

    let report = orchestrator.start(cli.mode(), cancel).await?;
    info!(
        "watchmod finished: {} target(s), {} startup run(s)",
        report.targets, report.startup_runs
    );
    Ok(())
}
