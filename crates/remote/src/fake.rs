// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake remote runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::RemoteError;
use crate::runner::{RemoteOutput, RemoteRunner};

/// Recorded remote call
#[derive(Debug, Clone)]
pub enum RemoteCall {
    Run { host: String, cmd: String },
    CopyTo {
        local: PathBuf,
        host: String,
        remote: String,
    },
}

struct Rule {
    host: Option<String>,
    substring: String,
    response: Result<RemoteOutput, RemoteError>,
    /// Consume the rule after one hit (for flaky-then-recovered hosts).
    once: bool,
}

struct FakeRemoteState {
    rules: Vec<Rule>,
    offline_hosts: Vec<String>,
    /// Copies that fail with a connection error before one succeeds.
    copy_failures_remaining: u32,
    calls: Vec<RemoteCall>,
}

/// Fake remote runner with scripted responses.
///
/// Responses are matched by command substring, first rule wins;
/// unmatched commands succeed with empty output.
#[derive(Clone)]
pub struct FakeRemote {
    inner: Arc<Mutex<FakeRemoteState>>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeRemoteState {
                rules: Vec::new(),
                offline_hosts: Vec::new(),
                copy_failures_remaining: 0,
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `substring` succeed with `stdout`.
    pub fn respond(&self, substring: &str, stdout: &str) {
        self.push_rule(None, substring, Ok(ok_output(stdout)), false);
    }

    /// Commands containing `substring` on `host` succeed with `stdout`.
    pub fn respond_on(&self, host: &str, substring: &str, stdout: &str) {
        self.push_rule(Some(host), substring, Ok(ok_output(stdout)), false);
    }

    /// Commands containing `substring` return the given full output.
    pub fn respond_output(&self, substring: &str, output: RemoteOutput) {
        self.push_rule(None, substring, Ok(output), false);
    }

    /// Commands containing `substring` fail with the given error.
    pub fn respond_err(&self, substring: &str, err: RemoteError) {
        self.push_rule(None, substring, Err(err), false);
    }

    /// One-shot variant of [`respond_output`](Self::respond_output):
    /// the rule is removed after its first match.
    pub fn respond_output_once(&self, substring: &str, output: RemoteOutput) {
        self.push_rule(None, substring, Ok(output), true);
    }

    /// Every command to `host` behaves like a refused connection.
    pub fn set_offline(&self, host: &str) {
        self.inner.lock().offline_hosts.push(host.to_string());
    }

    /// Bring a previously offline host back.
    pub fn set_online(&self, host: &str) {
        self.inner.lock().offline_hosts.retain(|h| h != host);
    }

    /// The next `n` copy attempts fail with a connection error.
    pub fn fail_copies(&self, n: u32) {
        self.inner.lock().copy_failures_remaining = n;
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().calls.clone()
    }

    /// Commands run on one host, in order.
    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RemoteCall::Run { host: h, cmd } if h == host => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of run calls whose command contains `substring`.
    pub fn run_count(&self, substring: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RemoteCall::Run { cmd, .. } if cmd.contains(substring)))
            .count()
    }

    fn push_rule(
        &self,
        host: Option<&str>,
        substring: &str,
        response: Result<RemoteOutput, RemoteError>,
        once: bool,
    ) {
        self.inner.lock().rules.push(Rule {
            host: host.map(str::to_string),
            substring: substring.to_string(),
            response,
            once,
        });
    }

    fn lookup(&self, host: &str, cmd: &str) -> Result<RemoteOutput, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Run {
            host: host.to_string(),
            cmd: cmd.to_string(),
        });

        if inner.offline_hosts.iter().any(|h| h == host) {
            return Ok(RemoteOutput {
                stdout: String::new(),
                stderr: format!("ssh: connect to host {host} port 22: Connection refused"),
                exit_code: 255,
            });
        }

        let hit = inner.rules.iter().position(|r| {
            cmd.contains(&r.substring) && r.host.as_deref().map(|h| h == host).unwrap_or(true)
        });
        match hit {
            Some(i) => {
                let response = inner.rules[i].response.clone();
                if inner.rules[i].once {
                    inner.rules.remove(i);
                }
                response
            }
            None => Ok(RemoteOutput::default()),
        }
    }
}

fn ok_output(stdout: &str) -> RemoteOutput {
    RemoteOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: 0,
    }
}

#[async_trait]
impl RemoteRunner for FakeRemote {
    async fn run(&self, host: &str, cmd: &str) -> Result<RemoteOutput, RemoteError> {
        self.lookup(host, cmd)
    }

    async fn run_with_timeout(
        &self,
        host: &str,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<RemoteOutput, RemoteError> {
        self.lookup(host, cmd)
    }

    async fn copy_to_once(
        &self,
        local: &Path,
        host: &str,
        remote: &str,
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::CopyTo {
            local: local.to_path_buf(),
            host: host.to_string(),
            remote: remote.to_string(),
        });
        if inner.offline_hosts.iter().any(|h| h == host) {
            return Err(RemoteError::Connection {
                host: host.to_string(),
            });
        }
        if inner.copy_failures_remaining > 0 {
            inner.copy_failures_remaining -= 1;
            return Err(RemoteError::Connection {
                host: host.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
