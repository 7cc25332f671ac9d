// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::engine::queue::EventSender;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::event::from_notify;
use crate::watch::filter::EventFilter;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl WatcherHandle {
    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Start watching `root` recursively.
///
/// Every raw notification is translated into [`ChangeEvent`]s, passed through
/// `filter` on the notify callback thread, and accepted events are pushed to
/// `queue`. Notify errors (including overflow of the OS event buffer) are
/// logged and otherwise ignored; events lost that way are not recoverable.
///
/// [`ChangeEvent`]: crate::watch::event::ChangeEvent
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    fs: Arc<dyn FileSystem>,
    filter: Arc<EventFilter>,
    queue: EventSender,
) -> Result<WatcherHandle> {
    let root = root.into();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let observed_at = Instant::now();
                for change in from_notify(event, observed_at) {
                    if !filter.should_accept(fs.as_ref(), &change) {
                        continue;
                    }
                    debug!(path = ?change.path, kind = %change.kind, "queueing change event");
                    if !queue.enqueue(change) {
                        debug!("event queue closed; dropping change event");
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "file watch error");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    Ok(WatcherHandle {
        _inner: watcher,
        root,
    })
}
