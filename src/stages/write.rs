// src/stages/write.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::engine::{PipelineState, Stage};
use crate::fs::FileSystem;

/// Write each stream to `<dest>/<stream name>`, creating directories.
///
/// The destination should be on the rule set's ignore list, or the writes
/// will be picked up as new changes.
pub struct WriteStage {
    dest: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteStage").field("dest", &self.dest).finish()
    }
}

impl WriteStage {
    pub fn new(dest: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            dest: dest.into(),
            fs,
        }
    }
}

impl Stage for WriteStage {
    fn name(&self) -> &str {
        "write"
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        for stream in state.streams() {
            let name = stream.name();
            if name.split('/').any(|part| part == "..") {
                bail!("refusing to write stream '{}' outside {:?}", name, self.dest);
            }
            let target = self.dest.join(name);
            self.fs
                .write(&target, stream.contents())
                .with_context(|| format!("writing stream '{}'", name))?;
            info!(stream = %name, target = ?target, "wrote stream");
        }
        Ok(())
    }
}
