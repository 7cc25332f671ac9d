//! Recording doubles for the dispatcher's collaborators.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use pipewatch::engine::{PipeStream, PipelineState, Reporter, Stage, StreamLoader};
use pipewatch::fs::FileSystem;

/// Stream loader that reads through a [`FileSystem`] and records every
/// open and release.
///
/// Clones share the same log.
#[derive(Clone)]
pub struct CountingLoader {
    fs: Arc<dyn FileSystem>,
    opened: Arc<Mutex<Vec<String>>>,
    released: Arc<Mutex<Vec<String>>>,
    fail_open: Arc<Mutex<HashSet<String>>>,
    fail_release: Arc<Mutex<HashSet<String>>>,
}

impl CountingLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            opened: Arc::default(),
            released: Arc::default(),
            fail_open: Arc::default(),
            fail_release: Arc::default(),
        }
    }

    /// Make opening the stream called `name` fail.
    pub fn fail_open_of(&self, name: &str) {
        self.fail_open.lock().unwrap().insert(name.to_string());
    }

    /// Make releasing the stream called `name` fail.
    pub fn fail_release_of(&self, name: &str) {
        self.fail_release.lock().unwrap().insert(name.to_string());
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    /// Release attempts, in order, including failed ones.
    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }

    /// Streams that were opened but never handed back.
    pub fn leaked(&self) -> Vec<String> {
        let mut released = self.released();
        let mut leaked = Vec::new();
        for name in self.opened() {
            match released.iter().position(|r| *r == name) {
                Some(i) => {
                    released.remove(i);
                }
                None => leaked.push(name),
            }
        }
        leaked
    }

    pub fn clear(&self) {
        self.opened.lock().unwrap().clear();
        self.released.lock().unwrap().clear();
    }
}

impl StreamLoader for CountingLoader {
    fn open(&self, path: &Path, name: &str) -> Result<PipeStream> {
        if self.fail_open.lock().unwrap().contains(name) {
            bail!("open of '{}' refused", name);
        }
        let contents = self.fs.read(path)?;
        self.opened.lock().unwrap().push(name.to_string());
        Ok(PipeStream::from_file(name, path, contents))
    }

    fn release(&self, stream: PipeStream) -> Result<()> {
        let name = stream.name().to_string();
        self.released.lock().unwrap().push(name.clone());
        if self.fail_release.lock().unwrap().contains(&name) {
            bail!("release of '{}' refused", name);
        }
        Ok(())
    }
}

/// One stage invocation as seen by a [`RecordingStage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCall {
    pub stage: String,
    pub streams: Vec<String>,
}

/// Shared, ordered log of stage invocations across rules.
pub type CallLog = Arc<Mutex<Vec<StageCall>>>;

pub fn call_log() -> CallLog {
    Arc::default()
}

/// Names of the stages in `log`, in call order.
pub fn stage_order(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|c| c.stage.clone()).collect()
}

/// Stage that records the stream names it sees and otherwise does nothing.
pub struct RecordingStage {
    name: String,
    log: CallLog,
}

impl RecordingStage {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
        }
    }
}

impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        self.log.lock().unwrap().push(StageCall {
            stage: self.name.clone(),
            streams: state.names().into_iter().map(String::from).collect(),
        });
        Ok(())
    }
}

/// Stage that records its call and then fails.
pub struct FailingStage {
    inner: RecordingStage,
}

impl FailingStage {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            inner: RecordingStage::new(name, log),
        }
    }
}

impl Stage for FailingStage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        self.inner.apply(state)?;
        Err(anyhow!("{} blew up", self.inner.name))
    }
}

/// Stage that records its call and then panics.
pub struct PanickingStage {
    inner: RecordingStage,
}

impl PanickingStage {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            inner: RecordingStage::new(name, log),
        }
    }
}

impl Stage for PanickingStage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        self.inner.apply(state)?;
        panic!("{} panicked", self.inner.name);
    }
}

/// What a [`RecordingReporter`] was told, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reported {
    Processing { rule: String, stream: String },
    LoadFailed { rule: String, path: String },
    StageFailed { rule: String, stage: String, cause: String },
    ReleaseFailed { rule: String, stream: String },
    Finished { rule: String },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<Reported>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Reported> {
        self.events.lock().unwrap().clone()
    }

    pub fn finished_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Reported::Finished { .. }))
            .count()
    }

    pub fn stage_failures(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Reported::StageFailed { rule, stage, .. } => Some((rule, stage)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Reported) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn processing(&self, rule: &str, stream: &str) {
        self.push(Reported::Processing {
            rule: rule.to_string(),
            stream: stream.to_string(),
        });
    }

    fn load_failed(&self, rule: &str, path: &str, _error: &anyhow::Error) {
        self.push(Reported::LoadFailed {
            rule: rule.to_string(),
            path: path.to_string(),
        });
    }

    fn stage_failed(&self, rule: &str, stage: &str, cause: &str) {
        self.push(Reported::StageFailed {
            rule: rule.to_string(),
            stage: stage.to_string(),
            cause: cause.to_string(),
        });
    }

    fn release_failed(&self, rule: &str, stream: &str, _error: &anyhow::Error) {
        self.push(Reported::ReleaseFailed {
            rule: rule.to_string(),
            stream: stream.to_string(),
        });
    }

    fn finished(&self, rule: &str, _elapsed: Duration) {
        self.push(Reported::Finished {
            rule: rule.to_string(),
        });
    }
}
