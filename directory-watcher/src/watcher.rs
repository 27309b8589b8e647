//! Directory watcher implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{Result, WatcherError};
use crate::event::ChangeEvent;
use crate::filter::ExclusionFilter;
use crate::paths::WatchTarget;
use crate::runner::{CommandExecutor, CommandResult};

/// Raw notifications delivered by a subscription.
pub type RawEvents = mpsc::UnboundedReceiver<notify::Result<notify::Event>>;

/// An open filesystem subscription for one directory.
///
/// Dropping it releases the underlying watch.
pub struct Subscription {
    _watcher: RecommendedWatcher,

    /// Notifications and errors, in arrival order.
    pub events: RawEvents,
}

/// What the watcher did with one change event.
#[derive(Debug)]
pub enum EventOutcome {
    /// Not a write or rename.
    Ignored,

    /// The file name matched the exclusion filter.
    Excluded,

    /// The same path already triggered a run inside the debounce window.
    Debounced,

    /// The bound command ran.
    Executed(CommandResult),
}

/// Watches one directory and runs one command when it changes.
///
/// Events are handled strictly in arrival order: the next event is not read
/// until the command triggered by the previous one has finished.
pub struct DirectoryWatcher {
    target: WatchTarget,
    filter: Arc<ExclusionFilter>,
    executor: Arc<dyn CommandExecutor>,
    debounce: Option<Duration>,
    last_run: HashMap<PathBuf, Instant>,
}

impl DirectoryWatcher {
    /// Create a watcher for `target`.
    pub fn new(
        target: WatchTarget,
        filter: Arc<ExclusionFilter>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            target,
            filter,
            executor,
            debounce: None,
            last_run: HashMap::new(),
        }
    }

    /// Suppress repeat triggers for the same path within `window`.
    pub fn with_debounce(mut self, window: Option<Duration>) -> Self {
        self.debounce = window;
        self
    }

    /// The watched directory.
    pub fn directory(&self) -> &Path {
        &self.target.directory
    }

    /// The bound command.
    pub fn command(&self) -> &Path {
        &self.target.command
    }

    /// Open a subscription and register the directory with it.
    pub fn subscribe(&self) -> Result<Subscription> {
        let dir = self.directory();
        if !dir.exists() {
            return Err(WatcherError::DirectoryNotFound(dir.display().to_string()));
        }
        if !dir.is_dir() {
            return Err(WatcherError::Config(format!(
                "Path is not a directory: {}",
                dir.display()
            )));
        }

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                // The receiver is gone once the watcher is shutting down.
                let _ = tx.send(res);
            },
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Subscription {
            _watcher: watcher,
            events,
        })
    }

    /// Subscribe and react to changes until `cancel` fires or the
    /// subscription reports an error.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        let mut subscription = self.subscribe()?;
        info!("Done setting up watchmod for {}", self.directory().display());

        let result = self.process(&mut subscription.events, cancel).await;
        drop(subscription);
        debug!("Released watch on {}", self.directory().display());
        result
    }

    /// Drain `events` until cancelled. A notification error or a closed
    /// channel ends the loop with an error.
    pub async fn process(&mut self, events: &mut RawEvents, cancel: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Stopping watch on {}", self.directory().display());
                    return Ok(());
                }
                received = events.recv() => match received {
                    Some(Ok(event)) => {
                        for change in ChangeEvent::from_notify(event) {
                            self.handle(change).await;
                        }
                    }
                    Some(Err(e)) => {
                        error!("Watch error on {}: {e}", self.directory().display());
                        return Err(e.into());
                    }
                    None => return Err(WatcherError::ChannelClosed),
                },
            }
        }
    }

    /// Filter one change event and run the command if it passes.
    pub async fn handle(&mut self, event: ChangeEvent) -> EventOutcome {
        if !event.triggers_command() {
            debug!("Ignoring {} event for {}", event.kind, event.path.display());
            return EventOutcome::Ignored;
        }

        info!("File changed: {}, event: {}", event.path.display(), event.kind);
        if self.filter.is_excluded(&event.file_name()) {
            return EventOutcome::Excluded;
        }

        if let Some(window) = self.debounce {
            let now = Instant::now();
            if let Some(last) = self.last_run.get(&event.path) {
                if now.duration_since(*last) < window {
                    info!(
                        "Debounced {}: last run started {:?} ago",
                        event.path.display(),
                        now.duration_since(*last)
                    );
                    return EventOutcome::Debounced;
                }
            }
            self.last_run
                .retain(|_, started| now.duration_since(*started) < window);
            self.last_run.insert(event.path.clone(), now);
        }

        EventOutcome::Executed(self.executor.execute(&self.target.command).await)
    }
}
