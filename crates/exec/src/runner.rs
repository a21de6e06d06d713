// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command runner contract shared by the local and SSH executors.

use async_trait::async_trait;
use thiserror::Error;

/// Output of one command execution.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("command timed out after {0}s")]
    Timeout(u64),
    #[error("ssh: {0}")]
    Ssh(String),
    #[error("interactive session failed: {0}")]
    SessionFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Execute a shell command, locally or on a remote host.
///
/// Implementations own their connection lifecycle; callers see one
/// command in, one [`RunOutput`] out.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &str) -> Result<RunOutput, ExecError>;
}

#[async_trait]
impl CommandRunner for Box<dyn CommandRunner> {
    async fn run(&self, cmd: &str) -> Result<RunOutput, ExecError> {
        (**self).run(cmd).await
    }
}
