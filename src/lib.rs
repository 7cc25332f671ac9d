// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod session;
pub mod stages;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::watch::{ChangeEvent, ChangeKind};

pub use crate::engine::{
    DispatchReport, Dispatcher, FailurePolicy, PipeStream, PipelineState, Stage, StageOutcome,
    Trigger, WatchRule,
};
pub use crate::session::WatchSession;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - session / rule registration
/// - either a one-shot dispatch (`--once`) or the watcher + dispatch loop
/// - Ctrl-C handling (inside [`WatchSession::start_watching`])
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = args
        .root
        .clone()
        .unwrap_or_else(|| config_root_dir(&config_path));
    let session = WatchSession::from_config(&cfg, &root)?;

    if !args.once.is_empty() {
        return run_once(session, &root, &args.once).await;
    }

    info!(root = ?root, rules = session.registry().len(), "starting watcher");
    session.start_watching(&root).await?;
    Ok(())
}

/// Dispatch a change event for each path, in order, then return.
async fn run_once(session: WatchSession, root: &Path, paths: &[PathBuf]) -> Result<()> {
    let dispatcher = session.into_dispatcher(root)?;
    let events: Vec<ChangeEvent> = paths
        .iter()
        .map(|p| {
            let abs = if p.is_absolute() {
                p.clone()
            } else {
                dispatcher.root().join(p)
            };
            ChangeEvent::new(abs, ChangeKind::Changed)
        })
        .collect();

    tokio::task::spawn_blocking(move || {
        for event in &events {
            let report = dispatcher.dispatch(event);
            debug!(path = ?report.path, triggered = ?report.triggered(), "one-shot dispatch finished");
        }
    })
    .await?;

    Ok(())
}

/// Figure out a sensible watch root.
///
/// - If the config path has a non-empty parent (e.g. "site/Pipewatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Pipewatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print settings, ignore list and rules.
fn print_dry_run(cfg: &ConfigFile) {
    println!("pipewatch dry-run");
    println!("  config.throttle_window = {}", cfg.config.throttle_window);
    println!("  config.failure_policy = {:?}", cfg.config.failure_policy);
    if !cfg.watch.ignore.is_empty() {
        println!("  watch.ignore = {:?}", cfg.watch.ignore);
    }
    println!();

    println!("rules ({}):", cfg.rule.len());
    for rule in &cfg.rule {
        println!("  - {}", rule.name);
        println!("      globs: {:?}", rule.globs);
        if !rule.additional_files.is_empty() {
            println!("      additional_files: {:?}", rule.additional_files);
        }
        for (i, stage) in rule.pipeline.iter().enumerate() {
            println!("      stage {}: {:?}", i + 1, stage);
        }
    }

    debug!("dry-run complete (no watching)");
}
