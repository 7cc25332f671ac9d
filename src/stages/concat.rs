// src/stages/concat.rs

use anyhow::Result;
use tracing::debug;

use crate::engine::{PipeStream, PipelineState, Stage};

/// Merge every stream, in order, into one stream named `output`.
#[derive(Debug, Clone)]
pub struct ConcatStage {
    output: String,
    separator: String,
}

impl ConcatStage {
    pub fn new(output: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            separator: separator.into(),
        }
    }
}

impl Stage for ConcatStage {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        let mut merged = Vec::new();
        for (i, stream) in state.streams().iter().enumerate() {
            if i > 0 {
                merged.extend_from_slice(self.separator.as_bytes());
            }
            merged.extend_from_slice(stream.contents());
        }

        debug!(
            output = %self.output,
            inputs = state.len(),
            bytes = merged.len(),
            "concatenated streams"
        );
        state.replace(vec![PipeStream::new(self.output.clone(), merged)]);
        Ok(())
    }
}
