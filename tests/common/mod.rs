#![allow(dead_code)]

pub use pipewatch_test_utils::{builders, fakes, init_tracing, with_timeout};

use std::path::PathBuf;
use std::sync::Arc;

use pipewatch::engine::Dispatcher;
use pipewatch::fs::mock::MockFileSystem;
use pipewatch::session::WatchSession;
use pipewatch::watch::{ChangeEvent, ChangeKind};

use fakes::{call_log, CallLog, CountingLoader, RecordingReporter};

pub const ROOT: &str = "/site";

/// In-memory project under [`ROOT`] plus recording collaborators.
pub struct Fixture {
    pub fs: MockFileSystem,
    pub loader: CountingLoader,
    pub reporter: RecordingReporter,
    pub log: CallLog,
}

impl Fixture {
    /// Create the files (root-relative); each file's contents are its name.
    pub fn new(files: &[&str]) -> Self {
        let fs = MockFileSystem::new();
        for f in files {
            fs.add_file(abs(f), f.as_bytes());
        }
        let loader = CountingLoader::new(Arc::new(fs.clone()));
        Self {
            fs,
            loader,
            reporter: RecordingReporter::new(),
            log: call_log(),
        }
    }

    /// A session wired to the mock filesystem and the recorders.
    pub fn session(&self) -> WatchSession {
        WatchSession::new()
            .with_filesystem(Arc::new(self.fs.clone()))
            .with_stream_loader(Arc::new(self.loader.clone()))
            .with_reporter(Arc::new(self.reporter.clone()))
    }

    pub fn dispatcher(&self, session: WatchSession) -> Dispatcher {
        session
            .into_dispatcher(ROOT)
            .expect("mock root should resolve")
    }

    pub fn delete(&self, rel: &str) {
        self.fs.remove_file(abs(rel));
    }
}

pub fn abs(rel: &str) -> PathBuf {
    PathBuf::from(ROOT).join(rel)
}

pub fn changed(rel: &str) -> ChangeEvent {
    ChangeEvent::new(abs(rel), ChangeKind::Changed)
}

pub fn deleted(rel: &str) -> ChangeEvent {
    ChangeEvent::new(abs(rel), ChangeKind::Deleted)
}
