// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote command execution over ssh/scp subprocesses.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::error::{is_connection_error, RemoteError};
use crate::subprocess::run_with_timeout;

/// Maximum attempts for retriable connection failures.
pub const MAX_RETRIES: u32 = 5;

/// Backoff between connection-failure retries.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Captured output of one remote invocation.
///
/// A non-zero exit is data, not an error; callers decide what a
/// failed probe means. `Err` is reserved for local spawn failures and
/// deadline expiry.
#[derive(Debug, Clone, Default)]
pub struct RemoteOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RemoteOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout and stderr together, for connection-error matching.
    pub fn combined(&self) -> String {
        let mut s = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !s.is_empty() {
                s.push('\n');
            }
            s.push_str(&self.stderr);
        }
        s
    }

    /// Translate a failed invocation into the user-facing error.
    pub fn to_error(&self, host: &str) -> RemoteError {
        crate::error::classify(host, &self.stderr, self.exit_code)
    }
}

impl From<std::process::Output> for RemoteOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }
}

/// Executes commands on remote hosts.
///
/// The production implementation shells out to `ssh`; tests use
/// `FakeRemote` with scripted responses.
#[async_trait]
pub trait RemoteRunner: Clone + Send + Sync + 'static {
    /// Run a command and wait for it, without a deadline.
    async fn run(&self, host: &str, cmd: &str) -> Result<RemoteOutput, RemoteError>;

    /// Run a command, killing the subprocess when the deadline expires.
    async fn run_with_timeout(
        &self,
        host: &str,
        cmd: &str,
        timeout: Duration,
    ) -> Result<RemoteOutput, RemoteError>;

    /// Single scp attempt. Implementations classify failures; the
    /// retry loop lives in [`copy_to`](Self::copy_to).
    async fn copy_to_once(
        &self,
        local: &Path,
        host: &str,
        remote: &str,
    ) -> Result<(), RemoteError>;

    /// Copy a local file to a remote path via scp, with the same
    /// retry policy as [`run_with_retry`](Self::run_with_retry).
    async fn copy_to(&self, local: &Path, host: &str, remote: &str) -> Result<(), RemoteError> {
        self.copy_to_after(local, host, remote, RETRY_BACKOFF).await
    }

    /// [`copy_to`](Self::copy_to) with an explicit backoff, so tests
    /// do not sleep for minutes.
    async fn copy_to_after(
        &self,
        local: &Path,
        host: &str,
        remote: &str,
        backoff: Duration,
    ) -> Result<(), RemoteError> {
        let mut attempt = 1u32;
        loop {
            let result = self.copy_to_once(local, host, remote).await;
            let retriable = matches!(&result, Err(err) if err.is_retriable());
            if !retriable || attempt >= MAX_RETRIES {
                return result;
            }
            tracing::warn!(host, attempt, "scp connection error, retrying after backoff");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// Run with up to [`MAX_RETRIES`] attempts, backing off
    /// [`RETRY_BACKOFF`] between them, but only while the combined
    /// output looks like a connection failure. Anything else returns
    /// immediately.
    async fn run_with_retry(&self, host: &str, cmd: &str) -> Result<RemoteOutput, RemoteError> {
        self.run_with_retry_after(host, cmd, RETRY_BACKOFF).await
    }

    /// [`run_with_retry`](Self::run_with_retry) with an explicit
    /// backoff, so tests do not sleep for minutes.
    async fn run_with_retry_after(
        &self,
        host: &str,
        cmd: &str,
        backoff: Duration,
    ) -> Result<RemoteOutput, RemoteError> {
        let mut attempt = 1u32;
        loop {
            let result = self.run(host, cmd).await;
            let retriable = match &result {
                Ok(output) => !output.success() && is_connection_error(&output.combined()),
                Err(err) => err.is_retriable(),
            };
            if !retriable || attempt >= MAX_RETRIES {
                return result;
            }
            tracing::warn!(host, attempt, "connection error, retrying after backoff");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// Production runner invoking the system `ssh`/`scp` binaries.
///
/// Authentication is whatever the user's ssh config says; no secrets
/// pass through here.
#[derive(Clone, Default)]
pub struct SshRunner;

impl SshRunner {
    pub fn new() -> Self {
        Self
    }

    /// `-o` options for non-interactive invocations: bounded connect
    /// time, and no password prompts that would hang a worker forever.
    fn batch_options(cmd: &mut Command) {
        cmd.arg("-o")
            .arg("ConnectTimeout=10")
            .arg("-o")
            .arg("BatchMode=yes");
    }

    /// Run attached to the controlling TTY, for attach-to-session UX.
    /// The TUI must have released the terminal before calling this.
    pub async fn run_interactive(
        &self,
        host: &str,
        cmd: &str,
    ) -> Result<std::process::ExitStatus, RemoteError> {
        let mut ssh = Command::new("ssh");
        ssh.arg("-t").arg(host).arg(cmd);
        ssh.status()
            .await
            .map_err(|e| RemoteError::Spawn(format!("ssh {host} failed: {e}")))
    }

    /// Run while forwarding stdout lines to a caller-supplied sink.
    /// Returns the final output status once the stream ends.
    pub async fn run_streaming(
        &self,
        host: &str,
        cmd: &str,
        sink: mpsc::Sender<String>,
    ) -> Result<i32, RemoteError> {
        let mut ssh = Command::new("ssh");
        Self::batch_options(&mut ssh);
        ssh.arg(host).arg(cmd);
        ssh.stdout(Stdio::piped()).stderr(Stdio::null());

        let mut child = ssh
            .spawn()
            .map_err(|e| RemoteError::Spawn(format!("ssh {host} failed: {e}")))?;
        let Some(stdout) = child.stdout.take() else {
            return Err(RemoteError::Spawn(format!("ssh {host}: no stdout pipe")));
        };

        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if sink.send(line).await.is_err() {
                break;
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| RemoteError::Spawn(format!("ssh {host} failed: {e}")))?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[async_trait]
impl RemoteRunner for SshRunner {
    async fn run(&self, host: &str, cmd: &str) -> Result<RemoteOutput, RemoteError> {
        let mut ssh = Command::new("ssh");
        Self::batch_options(&mut ssh);
        ssh.arg(host).arg(cmd);
        let output = ssh
            .output()
            .await
            .map_err(|e| RemoteError::Spawn(format!("ssh {host} failed: {e}")))?;
        Ok(output.into())
    }

    async fn run_with_timeout(
        &self,
        host: &str,
        cmd: &str,
        timeout: Duration,
    ) -> Result<RemoteOutput, RemoteError> {
        let mut ssh = Command::new("ssh");
        Self::batch_options(&mut ssh);
        ssh.arg(host).arg(cmd);
        let output = run_with_timeout(ssh, timeout, &format!("ssh {host}")).await?;
        Ok(output.into())
    }

    async fn copy_to_once(
        &self,
        local: &Path,
        host: &str,
        remote: &str,
    ) -> Result<(), RemoteError> {
        let mut scp = Command::new("scp");
        Self::batch_options(&mut scp);
        scp.arg("-q")
            .arg(local)
            .arg(format!("{host}:{remote}"));
        let output = scp
            .output()
            .await
            .map_err(|e| RemoteError::Spawn(format!("scp to {host} failed: {e}")))?;
        let output: RemoteOutput = output.into();
        if !output.success() {
            // Classification runs the connection regex over scp's
            // output, so the retry loop gates on the same patterns as
            // run_with_retry.
            return Err(output.to_error(host));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
