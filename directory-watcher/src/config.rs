//! Configuration types for watchmod.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, WatcherError};
use crate::paths;

/// Configuration for a watchmod run.
///
/// Decoded from a JSON5 file (comments and trailing commas allowed). Keys are
/// camelCase; the keys of older config files are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchConfig {
    /// Directory to command mapping. Both sides may contain environment
    /// variables and relative paths; they are resolved before use.
    #[serde(default, alias = "WatchCommand")]
    pub watch_targets: BTreeMap<String, String>,

    /// Exact base names that never trigger a command.
    #[serde(default, alias = "ExcludeFiles", alias = "ExcludedFiles")]
    pub exclude_file_names: Vec<String>,

    /// Literal substrings; a base name containing any of them is ignored.
    #[serde(default, alias = "ExcludeStrings")]
    pub exclude_strings: Vec<String>,

    /// Run every command once before watching.
    #[serde(default, alias = "RunCmdOnStart")]
    pub run_on_start: bool,

    /// Log the output of successful commands.
    #[serde(default = "default_print_stdout", alias = "PrintStdOut")]
    pub print_stdout: bool,

    /// Drop repeat triggers for the same path within this many milliseconds.
    /// Absent means every write/rename event triggers a run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

fn default_print_stdout() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watch_targets: BTreeMap::new(),
            exclude_file_names: Vec::new(),
            exclude_strings: Vec::new(),
            run_on_start: false,
            print_stdout: default_print_stdout(),
            debounce_ms: None,
        }
    }
}

impl WatchConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a configuration from JSON5 text.
    pub fn from_json5_str(text: &str) -> Result<Self> {
        json5::from_str(text).map_err(|e| WatcherError::Decode(e.to_string()))
    }

    /// Load a configuration file. The path is environment-expanded and made
    /// absolute before it is opened.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = path.as_ref().to_string_lossy();
        let resolved = paths::absolutize(&raw)?;
        info!("Config path: {}", resolved.display());

        let text = std::fs::read_to_string(&resolved).map_err(|e| {
            WatcherError::Config(format!("cannot read {}: {e}", resolved.display()))
        })?;
        Self::from_json5_str(&text)
    }

    /// Add a directory/command pair.
    pub fn with_target(mut self, directory: impl Into<String>, command: impl Into<String>) -> Self {
        self.watch_targets.insert(directory.into(), command.into());
        self
    }

    /// Add an excluded base name.
    pub fn exclude_file_name(mut self, name: impl Into<String>) -> Self {
        self.exclude_file_names.push(name.into());
        self
    }

    /// Add an excluded literal substring.
    pub fn exclude_string(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_strings.push(pattern.into());
        self
    }

    /// Set whether commands run once at startup.
    pub fn run_on_start(mut self, enabled: bool) -> Self {
        self.run_on_start = enabled;
        self
    }

    /// Set whether successful command output is logged.
    pub fn print_stdout(mut self, enabled: bool) -> Self {
        self.print_stdout = enabled;
        self
    }

    /// Enable duplicate-trigger suppression.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = Some(u64::try_from(window.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The duplicate-trigger window, if configured.
    pub fn debounce(&self) -> Option<Duration> {
        self.debounce_ms.map(Duration::from_millis)
    }
}
