// src/config/model.rs

use serde::Deserialize;

use crate::errors::{PipewatchError, Result};
use crate::types::{parse_duration, DispatchOptions, FailurePolicy};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// throttle_window = "30ms"
/// failure_policy = "continue"
///
/// [watch]
/// ignore = [".git", "dist"]
///
/// [[rule]]
/// name = "styles"
/// globs = ["**/*.css"]
/// additional_files = ["vars.less"]
/// pipeline = [
///   { kind = "concat", output = "bundle.css" },
///   { kind = "write", dest = "dist" },
/// ]
/// ```
///
/// Rules are an array of tables so they are registered in file order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Global behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Watcher-level settings from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// All rules from `[[rule]]`, in declaration order.
    #[serde(default)]
    pub rule: Vec<RuleConfig>,
}

impl ConfigFile {
    /// Effective dispatch options.
    pub fn dispatch_options(&self) -> Result<DispatchOptions> {
        let throttle_window = parse_duration(&self.config.throttle_window).map_err(|e| {
            PipewatchError::ConfigError(format!("invalid [config].throttle_window: {e}"))
        })?;
        Ok(DispatchOptions {
            failure_policy: self.config.failure_policy,
            throttle_window,
        })
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Minimum interval between two accepted events for the same path,
    /// e.g. `"30ms"`.
    #[serde(default = "default_throttle_window")]
    pub throttle_window: String,

    /// `"continue"` (default) or `"abort"`: what the rest of a pipeline does
    /// after one of its stages fails.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_throttle_window() -> String {
    "30ms".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            throttle_window: default_throttle_window(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Ignore globs. A path is also ignored when it is one of these entries
    /// taken as a literal path, or lies below one.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// One `[[rule]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub name: String,

    /// Primary globs; a change to a matching file re-runs the pipeline on
    /// that file.
    #[serde(default)]
    pub globs: Vec<String>,

    /// Secondary globs; a change to a matching file re-runs the pipeline on
    /// every file `globs` matches.
    #[serde(default)]
    pub additional_files: Vec<String>,

    /// Stages, run in order.
    #[serde(default)]
    pub pipeline: Vec<StageConfig>,
}

/// A built-in stage, selected by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StageConfig {
    /// Merge every stream into a single stream called `output`.
    Concat {
        output: String,
        #[serde(default)]
        separator: Option<String>,
    },
    /// Write each stream to `<root>/<dest>/<stream name>`.
    Write { dest: String },
    /// Run a shell command with the stream names as positional arguments.
    Command { cmd: String },
    /// Report stream names and sizes.
    Log,
}

impl StageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StageConfig::Concat { .. } => "concat",
            StageConfig::Write { .. } => "write",
            StageConfig::Command { .. } => "command",
            StageConfig::Log => "log",
        }
    }
}
