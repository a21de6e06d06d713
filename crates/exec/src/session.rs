// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent interactive shell session.
//!
//! Owns a long-lived child process (e.g. `cmsh`) plus a background reader
//! task that copies stdout lines onto an internal channel. Commands are
//! written with a double line-terminator so the interactive prompt echoes
//! again, which is what frames the response.
//!
//! Failures here are fatal by contract: a broken pipe or a missed frame
//! leaves the child in an unknown prompt state, so callers exit and let
//! the supervisor respawn a clean session.

use crate::runner::ExecError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reader channel depth; bounded by upstream command output size.
const LINE_BUFFER: usize = 1024;

/// Settings for one interactive session.
#[derive(Debug, Clone)]
pub struct ShellSessionConfig {
    /// Shell command line, whitespace-separated (e.g. `/cm/local/apps/cmd/bin/cmsh`).
    pub shell_cmd: String,
    /// Substring that marks the end of a response (the next prompt).
    pub stop_sequence: String,
    /// Responses keep only lines with exactly this many separated fields.
    pub column_count: usize,
    pub separator: char,
    /// Per-read timeout inside a response; banner reads use three times this.
    pub read_timeout: Duration,
}

/// A running interactive session.
#[derive(Debug)]
pub struct ShellSession {
    child: Child,
    stdin: ChildStdin,
    lines: mpsc::Receiver<String>,
    reader: JoinHandle<()>,
    config: ShellSessionConfig,
}

impl ShellSession {
    /// Spawn the shell and walk the fixed startup sequence: drain the
    /// banner, enter `device` mode, switch `events off`, drain residuals.
    pub async fn connect(config: ShellSessionConfig) -> Result<Self, ExecError> {
        let mut parts = config.shell_cmd.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ExecError::Spawn("empty shell command".to_string()))?;

        info!(shell = %config.shell_cmd, "creating the shell child process");
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::Spawn(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExecError::Spawn("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecError::Spawn("child stdout unavailable".to_string()))?;

        let (tx, lines) = mpsc::channel(LINE_BUFFER);
        let reader = tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let mut session = Self {
            child,
            stdin,
            lines,
            reader,
            config,
        };

        // Banner, then the fixed mode switches
        session.write("\n\n\n").await?;
        let banner_timeout = session.config.read_timeout * 3;
        session.read_line(banner_timeout).await?;

        session.write("device\n\n").await?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        session.write("events off\n\n").await?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        session.read_line(Duration::from_secs(10)).await?;
        session.drain();
        info!("shell session ready");

        Ok(session)
    }

    /// Run one command and collect its framed response.
    ///
    /// The prompt echo and the leading row are consumed, then lines whose
    /// field count matches the configured column count are concatenated
    /// until the stop sequence appears. A timeout mid-response returns the
    /// partial output with a warning; a timeout on the leading reads is
    /// fatal.
    pub async fn run(&mut self, cmd: &str) -> Result<String, ExecError> {
        self.write(&format!("{cmd}\n\n")).await?;

        let timeout = self.config.read_timeout;
        // prompt echo, then the leading row
        self.read_line(timeout * 3).await?;
        self.read_line(timeout).await?;

        let mut output = String::new();
        loop {
            match tokio::time::timeout(timeout, self.lines.recv()).await {
                Ok(Some(line)) => {
                    if line.contains(&self.config.stop_sequence) {
                        break;
                    }
                    if line.split(self.config.separator).count() == self.config.column_count {
                        output.push_str(&line);
                        output.push('\n');
                    }
                }
                Ok(None) => {
                    return Err(ExecError::SessionFailed(
                        "shell child closed stdout".to_string(),
                    ));
                }
                Err(_elapsed) => {
                    warn!("empty read queue mid-response, returning partial output");
                    break;
                }
            }
        }
        debug!(bytes = output.len(), "shell response collected");
        Ok(output)
    }

    /// Discard any buffered lines.
    pub fn drain(&mut self) {
        while self.lines.try_recv().is_ok() {}
    }

    async fn write(&mut self, data: &str) -> Result<(), ExecError> {
        let result = async {
            self.stdin.write_all(data.as_bytes()).await?;
            self.stdin.flush().await
        }
        .await;
        result.map_err(|e| ExecError::SessionFailed(format!("failed to write to pipe: {e}")))
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String, ExecError> {
        match tokio::time::timeout(timeout, self.lines.recv()).await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(ExecError::SessionFailed(
                "shell child closed stdout".to_string(),
            )),
            Err(_elapsed) => Err(ExecError::SessionFailed(format!(
                "no shell output within {}s",
                timeout.as_secs()
            ))),
        }
    }

    /// Ask the shell to exit, then reap the child and the reader.
    pub async fn close(mut self) {
        let _ = self.write("exit\n\n").await;
        let _ = self.write("exit\n\n").await;
        let _ = self.child.kill().await;
        self.reader.abort();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
