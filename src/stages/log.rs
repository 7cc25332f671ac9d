// src/stages/log.rs

use anyhow::Result;
use tracing::info;

use crate::engine::{PipelineState, Stage};

/// Log every stream's name and size; leaves the state untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStage;

impl Stage for LogStage {
    fn name(&self) -> &str {
        "log"
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        for stream in state.streams() {
            info!(stream = %stream.name(), bytes = stream.contents().len(), "pipeline stream");
        }
        Ok(())
    }
}
