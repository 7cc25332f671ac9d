// src/watch/event.rs

//! Change events and their mapping from raw `notify` events.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::EventKind;

/// Kind of change observed for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
    Renamed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Changed => "changed",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
        };
        f.write_str(s)
    }
}

/// A single accepted filesystem change, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path of the affected file.
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub observed_at: Instant,
}

impl ChangeEvent {
    /// Create an event observed now.
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self::at(path, kind, Instant::now())
    }

    /// Create an event with an explicit observation time.
    pub fn at(path: impl Into<PathBuf>, kind: ChangeKind, observed_at: Instant) -> Self {
        Self {
            path: path.into(),
            kind,
            observed_at,
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.kind == ChangeKind::Deleted
    }
}

/// Translate one raw `notify` event into zero or more change events.
///
/// Access notifications and metadata changes other than write-time updates
/// are not forwarded. A rename reported as a single `Both` event yields a
/// deletion of the old path and a rename onto the new one.
pub fn from_notify(event: notify::Event, observed_at: Instant) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Deleted,
        EventKind::Modify(ModifyKind::Name(mode)) => {
            return from_rename(mode, event.paths, observed_at);
        }
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))
        | EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)) => ChangeKind::Changed,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) | EventKind::Any => ChangeKind::Changed,
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| ChangeEvent::at(path, kind, observed_at))
        .collect()
}

fn from_rename(mode: RenameMode, paths: Vec<PathBuf>, observed_at: Instant) -> Vec<ChangeEvent> {
    match mode {
        RenameMode::From => paths
            .into_iter()
            .map(|p| ChangeEvent::at(p, ChangeKind::Deleted, observed_at))
            .collect(),
        RenameMode::To => paths
            .into_iter()
            .map(|p| ChangeEvent::at(p, ChangeKind::Renamed, observed_at))
            .collect(),
        RenameMode::Both => {
            let mut iter = paths.into_iter();
            let mut out = Vec::with_capacity(2);
            if let Some(from) = iter.next() {
                out.push(ChangeEvent::at(from, ChangeKind::Deleted, observed_at));
            }
            if let Some(to) = iter.next() {
                out.push(ChangeEvent::at(to, ChangeKind::Renamed, observed_at));
            }
            out
        }
        // Backends that cannot tell which side of the rename this is.
        RenameMode::Any | RenameMode::Other => paths
            .into_iter()
            .map(|p| {
                let kind = if p.exists() {
                    ChangeKind::Renamed
                } else {
                    ChangeKind::Deleted
                };
                ChangeEvent::at(p, kind, observed_at)
            })
            .collect(),
    }
}
