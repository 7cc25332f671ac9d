// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipewatch",
    version,
    about = "Watch a directory and re-run build pipelines for the files that changed.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Pipewatch.toml")]
    pub config: String,

    /// Directory to watch.
    ///
    /// Defaults to the directory containing the config file.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Dispatch a change event for each of these paths and exit without
    /// starting the watcher.
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub once: Vec<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the registered rules, but don't watch.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
