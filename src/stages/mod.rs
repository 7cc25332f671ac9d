// src/stages/mod.rs

//! Built-in pipeline stages available from the config file.
//!
//! - [`concat`] merges all streams into one.
//! - [`write`] writes streams below a destination directory.
//! - [`command`] runs a shell command over the stream names.
//! - [`log`] reports what is flowing through the pipeline.
//!
//! Embedders using the library API can register any [`Stage`] instead.

pub mod command;
pub mod concat;
pub mod log;
pub mod write;

use std::path::Path;
use std::sync::Arc;

use crate::config::model::StageConfig;
use crate::engine::Stage;
use crate::errors::Result;
use crate::fs::FileSystem;

pub use command::CommandStage;
pub use concat::ConcatStage;
pub use log::LogStage;
pub use write::WriteStage;

/// Instantiate the built-in stage described by `cfg`.
///
/// `root` is the watch root; relative destinations and command working
/// directories resolve against it.
pub fn build_stage(
    cfg: &StageConfig,
    root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<Arc<dyn Stage>> {
    let stage: Arc<dyn Stage> = match cfg {
        StageConfig::Concat { output, separator } => Arc::new(ConcatStage::new(
            output.clone(),
            separator.clone().unwrap_or_default(),
        )),
        StageConfig::Write { dest } => Arc::new(WriteStage::new(root.join(dest), fs)),
        StageConfig::Command { cmd } => Arc::new(CommandStage::new(cmd.clone(), root)),
        StageConfig::Log => Arc::new(LogStage),
    };
    Ok(stage)
}
