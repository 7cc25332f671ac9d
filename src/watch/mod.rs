// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling glob patterns (rule globs, additional files, ignore lists).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Filtering raw notifications (ignore list + per-path throttle) before
//!   they reach the event queue.
//!
//! It does **not** know about rules or pipelines; it only turns filesystem
//! changes into queued [`ChangeEvent`]s.

pub mod event;
pub mod filter;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event::{ChangeEvent, ChangeKind};
pub use filter::{EventFilter, IgnoreFilter, Throttle};
pub use patterns::{walk_files, PatternSet};
pub use watcher::{spawn_watcher, WatcherHandle};
