//! # Directory Watcher
//!
//! This crate is the core of `watchmod`: it watches directories and runs a
//! command whenever a file in one of them is written or renamed.
//!
//! ## Features
//!
//! - **Per-directory commands**: each watched directory is bound to one
//!   executable
//! - **Exclusions**: exact file names and literal substrings are ignored
//! - **Daemon and one-shot modes**: watch forever, or run every command once
//! - **Structured error sniffing**: JSON `{"success":false}` / `{"error":..}`
//!   output is reported in the log
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Orchestrator                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchConfig ──► WatchTarget* ──► DirectoryWatcher (one task)   │
//! │       │                                │                        │
//! │       ▼                                ▼                        │
//! │  ExclusionFilter (shared) ◄──── ChangeEvent ──► CommandRunner   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod orchestrator;
pub mod paths;
pub mod runner;
pub mod watcher;

#[cfg(test)]
mod test_support;

pub use config::WatchConfig;
pub use error::{Result, WatcherError};
pub use event::{ChangeEvent, ChangeKind};
pub use filter::{Exclusion, ExclusionFilter};
pub use orchestrator::{Orchestrator, RunMode, StartReport};
pub use paths::WatchTarget;
pub use runner::{CommandExecutor, CommandResult, CommandRunner, StructuredCommandError};
pub use watcher::{DirectoryWatcher, EventOutcome, Subscription};
