// src/engine/dispatch.rs

//! Synchronous dispatch core.
//!
//! [`Dispatcher::dispatch`] takes one accepted [`ChangeEvent`] through every
//! registered rule, in registration order:
//!
//! ```text
//! Idle -> Matching -> (no match) Idle
//!                  -> (match) Loading -> Running[1..N] -> Finalizing -> Idle
//! ```
//!
//! It has no channels and no Tokio types; the async shell in
//! [`runtime`](super::runtime) feeds it events one at a time.

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::engine::pipeline::{
    PipeStream, PipelineState, StageOutcome, StageReport, StreamLoader,
};
use crate::engine::registry::{WatchRegistry, WatchRule};
use crate::engine::report::Reporter;
use crate::fs::FileSystem;
use crate::types::FailurePolicy;
use crate::watch::event::ChangeEvent;
use crate::watch::filter::IgnoreFilter;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::walk_files;

/// Why a rule was triggered by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The changed file itself matched the rule's globs.
    Direct,
    /// The changed file matched the rule's additional files.
    AdditionalFile,
    /// A file matching the rule's globs was deleted.
    Deletion,
}

/// What one rule did for one event.
#[derive(Debug, Clone)]
pub struct RuleRun {
    pub rule: String,
    pub trigger: Trigger,
    /// Root-relative names of the inputs that were loaded, in load order.
    pub inputs: Vec<String>,
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
    /// Streams handed back to the loader at teardown.
    pub released: usize,
}

impl RuleRun {
    pub fn failed_stages(&self) -> impl Iterator<Item = &StageReport> {
        self.stages
            .iter()
            .filter(|s| matches!(s.outcome, StageOutcome::Failed(_)))
    }
}

/// Outcome of dispatching one event.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub path: PathBuf,
    /// Root-relative path, if the event lies under the root.
    pub relative: Option<String>,
    /// One entry per triggered rule, in registration order.
    pub runs: Vec<RuleRun>,
}

impl DispatchReport {
    pub fn triggered(&self) -> Vec<&str> {
        self.runs.iter().map(|r| r.rule.as_str()).collect()
    }

    pub fn run_for(&self, rule: &str) -> Option<&RuleRun> {
        self.runs.iter().find(|r| r.rule == rule)
    }
}

/// Matches events against rules and runs their pipelines.
pub struct Dispatcher {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    registry: Arc<WatchRegistry>,
    ignore: Arc<IgnoreFilter>,
    loader: Arc<dyn StreamLoader>,
    reporter: Arc<dyn Reporter>,
    policy: FailurePolicy,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("root", &self.root)
            .field("rules", &self.registry.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        root: PathBuf,
        fs: Arc<dyn FileSystem>,
        registry: Arc<WatchRegistry>,
        ignore: Arc<IgnoreFilter>,
        loader: Arc<dyn StreamLoader>,
        reporter: Arc<dyn Reporter>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            root,
            fs,
            registry,
            ignore,
            loader,
            reporter,
            policy,
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Evaluate every rule against `event` and run the triggered pipelines.
    ///
    /// Rule-level failures never escape: they are reported and recorded in
    /// the returned [`DispatchReport`].
    pub fn dispatch(&self, event: &ChangeEvent) -> DispatchReport {
        let relative = relative_str(self.fs.as_ref(), &self.root, &event.path);

        let mut report = DispatchReport {
            path: event.path.clone(),
            relative: relative.clone(),
            runs: Vec::new(),
        };

        let Some(rel) = relative else {
            warn!(
                "could not relativize path {:?} against root {:?}",
                event.path, self.root
            );
            return report;
        };

        debug!(path = %rel, kind = %event.kind, "dispatching change event");

        for rule in self.registry.iter() {
            if let Some(run) = self.dispatch_rule(rule, event, &rel) {
                report.runs.push(run);
            }
        }

        report
    }

    fn dispatch_rule(&self, rule: &WatchRule, event: &ChangeEvent, rel: &str) -> Option<RuleRun> {
        // Cheap pattern pre-check; the filesystem walk below only happens for
        // rules that could possibly be affected.
        let direct_pattern = rule.globs().is_match(rel);
        let additional_pattern = rule.additional_files().is_match(rel);
        if !direct_pattern && !additional_pattern {
            return None;
        }

        let files = match walk_files(self.fs.as_ref(), &self.root, &self.ignore) {
            Ok(files) => files,
            Err(err) => {
                warn!(rule = %rule.name(), error = %err, "failed to scan watch root");
                Vec::new()
            }
        };
        let matching = rule.globs().select(&files);
        let additional = rule.additional_files().select(&files);

        // A deleted file is no longer on disk, so it can only match by pattern.
        let deleted = event.is_deletion();
        let is_additional = additional.contains(rel) || (deleted && additional_pattern);
        let is_direct = matching.contains(rel) || (deleted && direct_pattern);

        let trigger = if is_additional {
            Trigger::AdditionalFile
        } else if is_direct && deleted {
            Trigger::Deletion
        } else if is_direct {
            Trigger::Direct
        } else {
            return None;
        };

        debug!(rule = %rule.name(), path = %rel, ?trigger, "rule triggered");

        let inputs: Vec<(PathBuf, String)> = match trigger {
            Trigger::Direct => vec![(event.path.clone(), rel.to_string())],
            Trigger::AdditionalFile | Trigger::Deletion => self.full_input_set(&matching),
        };

        Some(self.run_rule(rule, trigger, inputs))
    }

    fn full_input_set(&self, matching: &BTreeSet<String>) -> Vec<(PathBuf, String)> {
        matching
            .iter()
            .map(|name| (self.root.join(name), name.clone()))
            .collect()
    }

    fn run_rule(&self, rule: &WatchRule, trigger: Trigger, inputs: Vec<(PathBuf, String)>) -> RuleRun {
        let rule_name = rule.name();

        // Loading
        let mut streams: Vec<PipeStream> = Vec::with_capacity(inputs.len());
        for (path, name) in &inputs {
            match self.loader.open(path, name) {
                Ok(stream) => streams.push(stream),
                Err(err) => self.reporter.load_failed(rule_name, name, &err),
            }
        }
        let loaded: Vec<String> = streams.iter().map(|s| s.name().to_string()).collect();
        for name in &loaded {
            self.reporter.processing(rule_name, name);
        }

        // Running
        let mut state = PipelineState::new(streams);
        let started = Instant::now();
        let mut stages = Vec::with_capacity(rule.pipeline().len());
        let mut aborted = false;

        for stage in rule.pipeline() {
            if aborted {
                stages.push(StageReport {
                    stage: stage.name().to_string(),
                    outcome: StageOutcome::Skipped,
                });
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| stage.apply(&mut state)));
            let outcome = match result {
                Ok(Ok(())) => StageOutcome::Succeeded,
                Ok(Err(err)) => StageOutcome::Failed(format!("{err:#}")),
                Err(payload) => StageOutcome::Failed(panic_message(payload.as_ref())),
            };

            if let StageOutcome::Failed(cause) = &outcome {
                self.reporter.stage_failed(rule_name, stage.name(), cause);
                if self.policy == FailurePolicy::Abort {
                    aborted = true;
                }
            }

            stages.push(StageReport {
                stage: stage.name().to_string(),
                outcome,
            });
        }

        // Finalizing
        let elapsed = started.elapsed();
        self.reporter.finished(rule_name, elapsed);
        let released = self.release_all(rule_name, state);

        RuleRun {
            rule: rule_name.to_string(),
            trigger,
            inputs: loaded,
            stages,
            elapsed,
            released,
        }
    }

    /// Release every stream the run held. A failed release is reported and
    /// does not stop the others.
    fn release_all(&self, rule: &str, state: PipelineState) -> usize {
        let mut released = 0;
        for stream in state.into_all_streams() {
            let name = stream.name().to_string();
            match self.loader.release(stream) {
                Ok(()) => released += 1,
                Err(err) => self.reporter.release_failed(rule, &name, &err),
            }
        }
        released
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("stage panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("stage panicked: {s}")
    } else {
        "stage panicked".to_string()
    }
}
