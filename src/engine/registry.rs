// src/engine/registry.rs

use std::fmt;
use std::sync::Arc;

use anyhow::Result as AnyResult;

use crate::engine::pipeline::{FnStage, PipelineState, Stage};
use crate::errors::Result;
use crate::watch::patterns::PatternSet;

/// A registered association between primary globs, "additional file" globs
/// and an ordered pipeline.
///
/// - A change to a file matched by `globs` is a *direct match*: the pipeline
///   runs on that file alone (unless the change is a deletion).
/// - A change to a file matched by `additional_files` (e.g. a shared include)
///   re-runs the pipeline on every file `globs` currently matches.
#[derive(Clone)]
pub struct WatchRule {
    name: String,
    globs: PatternSet,
    additional_files: PatternSet,
    pipeline: Vec<Arc<dyn Stage>>,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<&str> = self.pipeline.iter().map(|s| s.name()).collect();
        f.debug_struct("WatchRule")
            .field("name", &self.name)
            .field("globs", &self.globs.patterns())
            .field("additional_files", &self.additional_files.patterns())
            .field("stages", &stages)
            .finish()
    }
}

impl WatchRule {
    /// Compile a rule with no additional files and an empty pipeline.
    /// Fails on a malformed glob.
    pub fn new<I, S>(name: impl Into<String>, globs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            name: name.into(),
            globs: PatternSet::new(globs)?,
            additional_files: PatternSet::empty(),
            pipeline: Vec::new(),
        })
    }

    /// Set the "additional file" patterns. Fails on a malformed glob.
    pub fn with_additional_files<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.additional_files = PatternSet::new(patterns)?;
        Ok(self)
    }

    /// Append a stage to the pipeline.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.pipeline.push(Arc::new(stage));
        self
    }

    /// Append an already shared stage.
    pub fn shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.pipeline.push(stage);
        self
    }

    /// Append a closure stage.
    pub fn stage_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut PipelineState) -> AnyResult<()> + Send + Sync + 'static,
    {
        self.stage(FnStage::new(name, f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn globs(&self) -> &PatternSet {
        &self.globs
    }

    pub fn additional_files(&self) -> &PatternSet {
        &self.additional_files
    }

    pub fn pipeline(&self) -> &[Arc<dyn Stage>] {
        &self.pipeline
    }
}

/// Ordered, append-only list of rules.
///
/// Built before watching starts; the dispatcher only reads it.
#[derive(Debug, Clone, Default)]
pub struct WatchRegistry {
    rules: Vec<WatchRule>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Rules registered with an empty name are called
    /// `rule-<index>`.
    pub fn register(&mut self, mut rule: WatchRule) {
        if rule.name.trim().is_empty() {
            rule.name = format!("rule-{}", self.rules.len());
        }
        self.rules.push(rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
