//! Change events from directory watching.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A filesystem change observed in a watched directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The kind of change.
    pub kind: ChangeKind,

    /// Path to the affected file or directory.
    pub path: PathBuf,

    /// When the event was received.
    pub observed_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            observed_at: Utc::now(),
        }
    }

    /// Split a raw notify event into one change event per affected path.
    pub fn from_notify(event: notify::Event) -> Vec<Self> {
        let kind = ChangeKind::from(event.kind);
        event
            .paths
            .into_iter()
            .map(|path| Self::new(kind, path))
            .collect()
    }

    /// Whether this event should run the bound command.
    pub fn triggers_command(&self) -> bool {
        self.kind.triggers_command()
    }

    /// Base name of the affected path, as matched by the exclusion filter.
    pub fn file_name(&self) -> String {
        base_name(&self.path)
    }
}

/// Final component of `path`, or the whole path when it has none (`/`, `..`).
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Kind of change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// File contents were written.
    Write,

    /// File was renamed away from this path.
    Rename,

    /// File was created.
    Create,

    /// File was removed.
    Remove,

    /// Permissions or other metadata changed.
    Metadata,

    /// File was accessed.
    Access,

    /// Unknown event type.
    Other,
}

impl ChangeKind {
    /// Only writes and renames run commands.
    pub fn triggers_command(self) -> bool {
        matches!(self, Self::Write | Self::Rename)
    }
}

impl From<notify::EventKind> for ChangeKind {
    fn from(kind: notify::EventKind) -> Self {
        use notify::event::{ModifyKind, RenameMode};

        match kind {
            notify::EventKind::Create(_) => Self::Create,
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                // A rename fires on the old name only. The new name shows up
                // like a created file, and the paired `Both` event repeats
                // paths already reported by `From`/`To`.
                ModifyKind::Name(RenameMode::To) => Self::Create,
                ModifyKind::Name(RenameMode::Both) => Self::Other,
                ModifyKind::Name(_) => Self::Rename,
                ModifyKind::Metadata(_) => Self::Metadata,
                ModifyKind::Data(_) | ModifyKind::Any => Self::Write,
                ModifyKind::Other => Self::Other,
            },
            notify::EventKind::Remove(_) => Self::Remove,
            notify::EventKind::Access(_) => Self::Access,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Write => "WRITE",
            Self::Rename => "RENAME",
            Self::Create => "CREATE",
            Self::Remove => "REMOVE",
            Self::Metadata => "CHMOD",
            Self::Access => "ACCESS",
            Self::Other => "OTHER",
        };
        f.write_str(name)
    }
}
