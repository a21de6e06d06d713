// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH command executor with a connect/close cycle around each command.
//!
//! Collectors must be eventually-available: the connect phase retries a
//! handful of times, then pauses and starts over, forever. Hosts that
//! resolve to this machine are promoted to local execution.

use crate::local::LocalRunner;
use crate::runner::{CommandRunner, ExecError, RunOutput};
use async_trait::async_trait;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Connect attempts per retry cycle.
pub const RETRY_ATTEMPTS: u32 = 6;

/// Pause between retry cycles.
pub const RETRY_PAUSE: Duration = Duration::from_secs(60);

/// Retry ladder for the connect phase. Attempts per cycle, pause between
/// cycles; cycles repeat indefinitely.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: RETRY_ATTEMPTS,
            pause: RETRY_PAUSE,
        }
    }
}

/// Connection settings for one remote host.
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub key_file: Option<PathBuf>,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub retry: RetryPolicy,
}

impl SshConfig {
    pub fn new(host: &str, username: &str) -> Self {
        Self {
            host: host.to_string(),
            port: 22,
            username: username.to_string(),
            password: None,
            key_file: None,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// True when the host names this machine (`localhost`, loopback, or the
/// local hostname).
pub fn is_local_host(host: &str) -> bool {
    if host == "localhost" || host == "127.0.0.1" {
        return true;
    }
    match hostname() {
        Some(name) => host == name,
        None => false,
    }
}

fn hostname() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .ok()
        .map(|s| s.trim().to_string())
}

/// Pick the right executor for a host: a forked shell for local mode,
/// SSH otherwise.
pub fn runner_for_host(config: SshConfig) -> Box<dyn CommandRunner> {
    if is_local_host(&config.host) {
        Box::new(LocalRunner::new(config.command_timeout))
    } else {
        Box::new(SshRunner::new(config))
    }
}

/// Remote command runner. Each `run` opens a session, authenticates,
/// executes, and closes.
pub struct SshRunner {
    config: SshConfig,
}

impl SshRunner {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CommandRunner for SshRunner {
    async fn run(&self, cmd: &str) -> Result<RunOutput, ExecError> {
        let mut attempts = self.config.retry.attempts;
        loop {
            let config = self.config.clone();
            let command = cmd.to_string();
            let result =
                tokio::task::spawn_blocking(move || exec_once(&config, &command))
                    .await
                    .map_err(|e| ExecError::Ssh(format!("executor task failed: {e}")))?;

            match result {
                Ok(output) if output.ok => return Ok(output),
                Ok(output) => {
                    warn!(host = %self.config.host, stderr = %output.stderr, "remote command failed");
                    attempts = attempts.saturating_sub(1);
                }
                Err(err) => {
                    warn!(host = %self.config.host, %err, "ssh attempt failed");
                    attempts = attempts.saturating_sub(1);
                }
            }

            if attempts == 0 {
                warn!(
                    host = %self.config.host,
                    pause_secs = self.config.retry.pause.as_secs(),
                    "max retry attempts reached, pausing before next cycle"
                );
                tokio::time::sleep(self.config.retry.pause).await;
                attempts = self.config.retry.attempts;
            }
        }
    }
}

fn ssh_err(err: ssh2::Error) -> ExecError {
    ExecError::Ssh(err.to_string())
}

/// One connect/auth/exec/close cycle (blocking; run on the blocking pool).
fn exec_once(config: &SshConfig, cmd: &str) -> Result<RunOutput, ExecError> {
    let addr = (config.host.as_str(), config.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| ExecError::Ssh(format!("cannot resolve {}", config.host)))?;
    let tcp = TcpStream::connect_timeout(&addr, config.connect_timeout)?;

    let mut session = ssh2::Session::new().map_err(ssh_err)?;
    session.set_tcp_stream(tcp);
    session.set_timeout(config.command_timeout.as_millis() as u32);
    session.handshake().map_err(ssh_err)?;

    authenticate(config, &session)?;
    debug!(host = %config.host, cmd, "executing remote command");

    let mut channel = session.channel_session().map_err(ssh_err)?;
    channel.exec(cmd).map_err(ssh_err)?;

    let mut stdout = String::new();
    channel.read_to_string(&mut stdout)?;
    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr)?;
    channel.wait_close().map_err(ssh_err)?;
    let status = channel.exit_status().map_err(ssh_err)?;

    // stderr output counts as failure: scheduler tools write usage errors
    // there while still exiting zero
    Ok(RunOutput {
        ok: status == 0 && stderr.is_empty(),
        stdout,
        stderr,
    })
}

fn authenticate(config: &SshConfig, session: &ssh2::Session) -> Result<(), ExecError> {
    if let Some(key_file) = &config.key_file {
        session
            .userauth_pubkey_file(&config.username, None, key_file, None)
            .map_err(ssh_err)?;
    } else if let Some(password) = &config.password {
        session
            .userauth_password(&config.username, password)
            .map_err(ssh_err)?;
    } else {
        let mut agent = session.agent().map_err(ssh_err)?;
        agent.connect().map_err(ssh_err)?;
        agent.list_identities().map_err(ssh_err)?;
        let identities = agent.identities().map_err(ssh_err)?;
        let authed = identities
            .iter()
            .any(|identity| agent.userauth(&config.username, identity).is_ok());
        if !authed {
            return Err(ExecError::Ssh("agent authentication failed".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
