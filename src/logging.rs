// src/logging.rs

//! Logging setup for `pipewatch`.
//!
//! Only the `pipewatch` target follows the requested level. Dependencies
//! such as `notify` and `globset` stay at `warn` so a `--log-level trace`
//! session shows the dispatch loop rather than backend chatter.
//!
//! Where the level comes from:
//! 1. `--log-level` CLI flag
//! 2. `PIPEWATCH_LOG`, either a bare level ("debug") or a full filter
//!    directive ("pipewatch::engine=trace,notify=debug")
//! 3. `info`
//!
//! Logs go to STDERR; STDOUT carries the short progress lines printed by the
//! console reporter.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV: &str = "PIPEWATCH_LOG";

const CRATE_TARGET: &str = "pipewatch";
const DEPENDENCY_LEVEL: &str = "warn";

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = filter_directives(cli_level, env.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter '{}'", directives))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Build the `EnvFilter` directive string for a CLI level and the raw value
/// of `PIPEWATCH_LOG`.
///
/// A bare level from either source is scoped to the `pipewatch` target. Any
/// other non-empty env value is passed through untouched.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return scoped(level_name(level));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match parse_level_str(raw) {
            Some(level) => scoped(level),
            None => raw.to_string(),
        },
        None => scoped("info"),
    }
}

fn scoped(level: &str) -> String {
    format!("{DEPENDENCY_LEVEL},{CRATE_TARGET}={level}")
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

fn parse_level_str(s: &str) -> Option<&'static str> {
    match s.to_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}
