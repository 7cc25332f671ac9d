// src/engine/report.rs

//! Progress side-channel.
//!
//! The dispatcher never reads anything back from a [`Reporter`]; it only
//! tells it what happened.

use std::time::Duration;

use tracing::{info, warn};

pub trait Reporter: Send + Sync {
    /// A rule is about to process `stream`.
    fn processing(&self, rule: &str, stream: &str);

    /// An input could not be loaded and was left out of the run.
    fn load_failed(&self, rule: &str, path: &str, error: &anyhow::Error);

    /// A stage failed; `cause` is the error or panic message.
    fn stage_failed(&self, rule: &str, stage: &str, cause: &str);

    /// A stream could not be released.
    fn release_failed(&self, rule: &str, stream: &str, error: &anyhow::Error);

    /// The rule's pipeline finished after `elapsed`.
    fn finished(&self, rule: &str, elapsed: Duration);
}

/// Default reporter: short lines on stdout, mirrored to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn processing(&self, rule: &str, stream: &str) {
        println!("[pipewatch] Processing pipeline for '{}'", stream);
        info!(rule = %rule, stream = %stream, "processing pipeline");
    }

    fn load_failed(&self, rule: &str, path: &str, error: &anyhow::Error) {
        println!("[pipewatch] Could not load '{}': {}", path, error);
        warn!(rule = %rule, path = %path, error = %error, "failed to load input stream; skipping it");
    }

    fn stage_failed(&self, rule: &str, stage: &str, cause: &str) {
        println!("[pipewatch] Stage '{}' failed: {}", stage, cause);
        warn!(rule = %rule, stage = %stage, cause = %cause, "pipeline stage failed");
    }

    fn release_failed(&self, rule: &str, stream: &str, error: &anyhow::Error) {
        warn!(rule = %rule, stream = %stream, error = %error, "failed to release stream");
    }

    fn finished(&self, rule: &str, elapsed: Duration) {
        println!("[pipewatch] Finished pipeline processing in {:.2?}", elapsed);
        info!(rule = %rule, elapsed_ms = elapsed.as_millis() as u64, "pipeline finished");
    }
}
