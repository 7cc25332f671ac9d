// src/engine/pipeline.rs

//! Pipeline carrier, stages and stream collaborators.
//!
//! A rule run loads its inputs into [`PipeStream`]s, wraps them in a
//! [`PipelineState`] and hands `&mut PipelineState` to each [`Stage`] in
//! order. Streams are released through the [`StreamLoader`] when the run
//! ends, whatever the stages did.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::fs::FileSystem;

/// In-memory contents of one input (or stage-produced) file.
///
/// Not `Clone`: each stream is released exactly once, and
/// release consumes it.
pub struct PipeStream {
    name: String,
    path: Option<PathBuf>,
    contents: Vec<u8>,
}

impl fmt::Debug for PipeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeStream")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("len", &self.contents.len())
            .finish()
    }
}

impl PipeStream {
    /// A stream produced by a stage, not backed by a file.
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            path: None,
            contents: contents.into(),
        }
    }

    /// A stream loaded from `path`.
    pub fn from_file(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            contents: contents.into(),
        }
    }

    /// Root-relative name, forward slashes.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) {
        self.contents = contents.into();
    }

    /// Give up the buffered contents (used on release).
    pub fn unload(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.contents)
    }
}

/// The mutable per-run carrier passed through every stage.
///
/// Stages may rewrite, add and drop streams. Dropped streams are parked
/// rather than destroyed so that teardown still releases every stream the
/// run ever held, once.
#[derive(Debug, Default)]
pub struct PipelineState {
    streams: Vec<PipeStream>,
    dropped: Vec<PipeStream>,
}

impl PipelineState {
    pub fn new(streams: Vec<PipeStream>) -> Self {
        Self {
            streams,
            dropped: Vec::new(),
        }
    }

    pub fn streams(&self) -> &[PipeStream] {
        &self.streams
    }

    /// Edit streams in place. Whole streams can only be swapped out through
    /// [`retain`](Self::retain) or [`replace`](Self::replace), which keep the
    /// old ones for release.
    pub fn streams_mut(&mut self) -> impl Iterator<Item = StreamEdit<'_>> {
        self.streams.iter_mut().map(StreamEdit)
    }

    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn push(&mut self, stream: PipeStream) {
        self.streams.push(stream);
    }

    /// Keep only the streams for which `keep` returns true.
    ///
    /// Every stream stays owned by the state while `keep` runs, so a panic
    /// in the predicate loses nothing.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&PipeStream) -> bool,
    {
        let mut i = 0;
        while i < self.streams.len() {
            if keep(&self.streams[i]) {
                i += 1;
            } else {
                let stream = self.streams.remove(i);
                self.dropped.push(stream);
            }
        }
    }

    /// Replace the current streams with `streams`.
    pub fn replace(&mut self, streams: Vec<PipeStream>) {
        let old = std::mem::replace(&mut self.streams, streams);
        self.dropped.extend(old);
    }

    /// Every stream held by this run: current ones first, then dropped ones.
    pub(crate) fn into_all_streams(self) -> Vec<PipeStream> {
        let mut all = self.streams;
        all.extend(self.dropped);
        all
    }
}

/// In-place access to one stream of a [`PipelineState`].
///
/// Reads go through `Deref`. The stream itself cannot be moved out or
/// overwritten, so it is still there to release when the run ends.
#[derive(Debug)]
pub struct StreamEdit<'a>(&'a mut PipeStream);

impl StreamEdit<'_> {
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.0.set_name(name);
    }

    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) {
        self.0.set_contents(contents);
    }
}

impl Deref for StreamEdit<'_> {
    type Target = PipeStream;

    fn deref(&self) -> &PipeStream {
        self.0
    }
}

/// One processing step of a rule's pipeline.
pub trait Stage: Send + Sync {
    /// Name used in progress output and run reports.
    fn name(&self) -> &str;

    /// Transform the current state in place.
    fn apply(&self, state: &mut PipelineState) -> Result<()>;
}

/// Adapter turning a closure into a [`Stage`].
pub struct FnStage<F> {
    name: String,
    f: F,
}

impl<F> FnStage<F>
where
    F: Fn(&mut PipelineState) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(&mut PipelineState) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        (self.f)(state)
    }
}

/// Result of running a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    /// The stage returned an error or panicked; the cause is kept as text.
    Failed(String),
    /// Not run because an earlier stage failed under the abort policy.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: String,
    pub outcome: StageOutcome,
}

/// Loads inputs into streams and releases them afterwards.
pub trait StreamLoader: Send + Sync {
    /// Open `path` as a stream called `name` (root-relative).
    fn open(&self, path: &Path, name: &str) -> Result<PipeStream>;

    /// Release a stream. Called exactly once per stream a run held.
    fn release(&self, stream: PipeStream) -> Result<()>;
}

/// Default loader: reads the whole file through a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct FsStreamLoader {
    fs: Arc<dyn FileSystem>,
}

impl FsStreamLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl StreamLoader for FsStreamLoader {
    fn open(&self, path: &Path, name: &str) -> Result<PipeStream> {
        let contents = self.fs.read(path)?;
        trace!(stream = %name, bytes = contents.len(), "loaded stream");
        Ok(PipeStream::from_file(name, path, contents))
    }

    fn release(&self, mut stream: PipeStream) -> Result<()> {
        let bytes = stream.unload().len();
        trace!(stream = %stream.name(), bytes, "released stream");
        Ok(())
    }
}
