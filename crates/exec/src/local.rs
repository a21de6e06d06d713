// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local command execution via `sh -c`.

use crate::runner::{CommandRunner, ExecError, RunOutput};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default per-command timeout for local execution.
pub const LOCAL_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs commands on this host through the system shell.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    timeout: Duration,
}

impl LocalRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new(LOCAL_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, cmd: &str) -> Result<RunOutput, ExecError> {
        debug!(cmd, "executing command locally");
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(io_err)) => return Err(ExecError::Spawn(io_err.to_string())),
            Err(_elapsed) => return Err(ExecError::Timeout(self.timeout.as_secs())),
        };
        Ok(RunOutput {
            ok: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
