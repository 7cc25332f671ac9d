// src/watch/filter.rs

//! Pre-queue filtering of raw change events.
//!
//! Two stages run synchronously inside the watcher callback:
//! 1. [`IgnoreFilter`] drops paths matching the configured ignore list.
//! 2. [`Throttle`] collapses bursts of notifications for the same path (one
//!    save often produces several OS events in quick succession).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::event::ChangeEvent;
use crate::watch::path_utils::{relative_str, to_forward_slashes};
use crate::watch::patterns::PatternSet;

/// How often the throttle table is swept for expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Ignore list: glob patterns plus literal path prefixes.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    globs: PatternSet,
    prefixes: Vec<String>,
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self {
            globs: PatternSet::empty(),
            prefixes: Vec::new(),
        }
    }
}

impl IgnoreFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes: Vec<String> = patterns
            .into_iter()
            .map(|p| to_forward_slashes(p.as_ref().trim()))
            .filter(|p| !p.is_empty())
            .collect();
        let globs = PatternSet::new(&prefixes)?;
        Ok(Self { globs, prefixes })
    }

    pub fn patterns(&self) -> &[String] {
        &self.prefixes
    }

    /// True if `abs` (or its root-relative form `rel`) matches an ignore glob
    /// or lies under an ignore entry taken as a literal path.
    pub fn is_ignored(&self, abs: &Path, rel: Option<&str>) -> bool {
        if self.prefixes.is_empty() {
            return false;
        }

        let abs = to_forward_slashes(&abs.to_string_lossy());
        let candidates = std::iter::once(abs.as_str()).chain(rel);

        for candidate in candidates {
            if self.globs.is_match(candidate) {
                return true;
            }
            if self.prefixes.iter().any(|p| has_path_prefix(candidate, p)) {
                return true;
            }
        }
        false
    }
}

/// True if `path` is `prefix` or lies below it. Matches whole path
/// components only, so `dist` covers `dist/app.js` but not `distribution.css`.
fn has_path_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[derive(Debug)]
struct ThrottleTable {
    entries: HashMap<PathBuf, Instant>,
    last_sweep: Option<Instant>,
}

/// Per-path time-window throttle.
///
/// An event is rejected when the same path was accepted at most `window`
/// ago (an interval of exactly `window` is still throttled). Rejected events
/// do not refresh the stored timestamp. Entries older than the window are
/// swept periodically, so the table only holds recently active paths.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    table: Mutex<ThrottleTable>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            table: Mutex::new(ThrottleTable {
                entries: HashMap::new(),
                last_sweep: None,
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether an event for `path` observed at `now` is accepted.
    pub fn should_accept_at(&self, path: &Path, now: Instant) -> bool {
        // A poisoned table only means another callback panicked mid-update;
        // the map itself is still usable.
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = table.entries.get(path) {
            if now.saturating_duration_since(*last) <= self.window {
                return false;
            }
        }

        table.entries.insert(path.to_path_buf(), now);
        self.maybe_sweep(&mut table, now);
        true
    }

    /// Number of paths currently tracked.
    pub fn tracked(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Drop every entry whose window has elapsed at `now`.
    pub fn sweep(&self, now: Instant) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        Self::evict_expired(&mut table, now, self.window);
    }

    fn maybe_sweep(&self, table: &mut ThrottleTable, now: Instant) {
        let due = match table.last_sweep {
            Some(last) => now.saturating_duration_since(last) >= SWEEP_INTERVAL,
            None => true,
        };
        if due {
            Self::evict_expired(table, now, self.window);
        }
    }

    fn evict_expired(table: &mut ThrottleTable, now: Instant, window: Duration) {
        let before = table.entries.len();
        table
            .entries
            .retain(|_, last| now.saturating_duration_since(*last) <= window);
        table.last_sweep = Some(now);
        let evicted = before - table.entries.len();
        if evicted > 0 {
            trace!(evicted, "swept expired throttle entries");
        }
    }
}

/// Combined ignore + throttle filter applied before events are queued.
#[derive(Debug)]
pub struct EventFilter {
    root: PathBuf,
    ignore: IgnoreFilter,
    throttle: Throttle,
}

impl EventFilter {
    pub fn new(root: impl Into<PathBuf>, ignore: IgnoreFilter, window: Duration) -> Self {
        Self {
            root: root.into(),
            ignore,
            throttle: Throttle::new(window),
        }
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Accept or drop `event`. The throttle clock is the event's own
    /// `observed_at` timestamp.
    pub fn should_accept(&self, fs: &dyn FileSystem, event: &ChangeEvent) -> bool {
        let rel = relative_str(fs, &self.root, &event.path);
        if self.ignore.is_ignored(&event.path, rel.as_deref()) {
            trace!(path = ?event.path, "dropping ignored event");
            return false;
        }

        if !self.throttle.should_accept_at(&event.path, event.observed_at) {
            trace!(path = ?event.path, kind = %event.kind, "dropping throttled event");
            return false;
        }

        true
    }
}
