//! Error types for the directory watcher.

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur while loading configuration or watching directories.
///
/// Command failures are not represented here: a failing command is logged
/// and reported through [`crate::CommandResult`], never propagated.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Directory not found.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// Invalid exclude pattern.
    #[error("invalid exclude pattern: {0}")]
    InvalidPattern(String),

    /// Notify error, either while subscribing or reported by the subscription.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be decoded.
    #[error("config decode error: {0}")]
    Decode(String),

    /// The notification channel closed while the watcher was still running.
    #[error("event channel closed")]
    ChannelClosed,

    /// A watcher task panicked or was aborted.
    #[error("watcher task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
