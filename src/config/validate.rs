// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, StageConfig};
use crate::errors::{PipewatchError, Result};
use crate::watch::{IgnoreFilter, PatternSet};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one rule
/// - `[config].throttle_window` parses
/// - every ignore glob compiles
/// - rule names are non-empty and unique
/// - every rule has at least one glob, and all its globs compile
/// - built-in stage settings are non-empty
///
/// Glob errors come back as [`PipewatchError::InvalidGlob`]; everything else
/// as [`PipewatchError::ConfigError`].
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_rules(cfg)?;
    cfg.dispatch_options()?;
    IgnoreFilter::new(&cfg.watch.ignore)?;
    validate_rules(cfg)?;
    Ok(())
}

fn ensure_has_rules(cfg: &ConfigFile) -> Result<()> {
    if cfg.rule.is_empty() {
        return Err(config_error(
            "config must contain at least one [[rule]] section",
        ));
    }
    Ok(())
}

fn validate_rules(cfg: &ConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for rule in &cfg.rule {
        let name = rule.name.trim();
        if name.is_empty() {
            return Err(config_error("every [[rule]] needs a non-empty `name`"));
        }
        if !seen.insert(name) {
            return Err(config_error(format!("duplicate rule name '{name}'")));
        }
        if rule.globs.iter().all(|g| g.trim().is_empty()) {
            return Err(config_error(format!(
                "rule '{name}' must have at least one entry in `globs`"
            )));
        }

        PatternSet::new(&rule.globs)?;
        PatternSet::new(&rule.additional_files)?;

        for stage in &rule.pipeline {
            validate_stage(name, stage)?;
        }
    }

    Ok(())
}

fn validate_stage(rule: &str, stage: &StageConfig) -> Result<()> {
    let empty_field = match stage {
        StageConfig::Concat { output, .. } if output.trim().is_empty() => Some("output"),
        StageConfig::Write { dest } if dest.trim().is_empty() => Some("dest"),
        StageConfig::Command { cmd } if cmd.trim().is_empty() => Some("cmd"),
        _ => None,
    };

    match empty_field {
        Some(field) => Err(config_error(format!(
            "rule '{}': {} stage has an empty `{}`",
            rule,
            stage.kind(),
            field
        ))),
        None => Ok(()),
    }
}

fn config_error(msg: impl Into<String>) -> PipewatchError {
    PipewatchError::ConfigError(msg.into())
}
