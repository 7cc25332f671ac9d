#![allow(dead_code)]

use pipewatch::config::{ConfigFile, ConfigSection, RuleConfig, StageConfig, WatchSection};
use pipewatch::types::FailurePolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile {
                config: ConfigSection::default(),
                watch: WatchSection::default(),
                rule: Vec::new(),
            },
        }
    }

    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.config.rule.push(rule);
        self
    }

    pub fn with_ignore(mut self, pattern: &str) -> Self {
        self.config.watch.ignore.push(pattern.to_string());
        self
    }

    pub fn with_throttle_window(mut self, window: &str) -> Self {
        self.config.config.throttle_window = window.to_string();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.config.failure_policy = policy;
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RuleConfig`.
pub struct RuleConfigBuilder {
    rule: RuleConfig,
}

impl RuleConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            rule: RuleConfig {
                name: name.to_string(),
                globs: vec![],
                additional_files: vec![],
                pipeline: vec![],
            },
        }
    }

    pub fn glob(mut self, pattern: &str) -> Self {
        self.rule.globs.push(pattern.to_string());
        self
    }

    pub fn additional_file(mut self, pattern: &str) -> Self {
        self.rule.additional_files.push(pattern.to_string());
        self
    }

    pub fn concat(mut self, output: &str) -> Self {
        self.rule.pipeline.push(StageConfig::Concat {
            output: output.to_string(),
            separator: None,
        });
        self
    }

    pub fn write(mut self, dest: &str) -> Self {
        self.rule.pipeline.push(StageConfig::Write {
            dest: dest.to_string(),
        });
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.rule.pipeline.push(StageConfig::Command {
            cmd: cmd.to_string(),
        });
        self
    }

    pub fn log(mut self) -> Self {
        self.rule.pipeline.push(StageConfig::Log);
        self
    }

    pub fn build(self) -> RuleConfig {
        self.rule
    }
}
