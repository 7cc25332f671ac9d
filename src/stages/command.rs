// src/stages/command.rs

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::engine::{PipelineState, Stage};

/// Run a shell command once per pipeline run.
///
/// The names of the current streams are passed as positional arguments, so
/// `cmd = "lessc \"$1\""` or `cmd = "cat \"$@\""` work with `sh`. The command
/// runs in the watch root. A non-zero exit status fails the stage.
#[derive(Debug, Clone)]
pub struct CommandStage {
    cmd: String,
    cwd: PathBuf,
}

impl CommandStage {
    pub fn new(cmd: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    fn build(&self, args: &[&str]) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd).args(args);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd).arg("pipewatch").args(args);
            c
        }
    }
}

impl Stage for CommandStage {
    fn name(&self) -> &str {
        "command"
    }

    fn apply(&self, state: &mut PipelineState) -> Result<()> {
        let names = state.names();
        info!(cmd = %self.cmd, inputs = names.len(), "running command stage");

        let output = self
            .build(&names)
            .current_dir(&self.cwd)
            .output()
            .with_context(|| format!("spawning command '{}'", self.cmd))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(cmd = %self.cmd, "stdout: {}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(cmd = %self.cmd, "stderr: {}", line);
        }

        if !output.status.success() {
            bail!(
                "command '{}' exited with code {}",
                self.cmd,
                output.status.code().unwrap_or(-1)
            );
        }
        Ok(())
    }
}
