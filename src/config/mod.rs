// src/config/mod.rs

//! Configuration loading and validation for pipewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate rules, globs and stage settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ConfigSection, RuleConfig, StageConfig, WatchSection};
pub use validate::validate_config;
