// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy and friendly translation of raw ssh stderr.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Errors from remote operations.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Transport-level failure. Retriable.
    #[error("SSH connection to {host} failed")]
    Connection { host: String },
    /// Authentication rejected. Never retried.
    #[error("SSH permission denied on {host}")]
    PermissionDenied { host: String },
    /// Host key mismatch. Never retried.
    #[error("SSH host key verification failed for {host}")]
    HostKeyVerification { host: String },
    /// Subprocess killed by deadline. Counts as a probe miss, not a
    /// state change.
    #[error("{description} timed out after {secs}s")]
    Timeout { description: String, secs: u64 },
    /// Non-zero exit from a remote helper, with the host tag.
    #[error("{host}: {message}")]
    Script { host: String, message: String },
    /// Failed to start or talk to the local ssh/scp subprocess.
    #[error("{0}")]
    Spawn(String),
    /// Malformed probe output.
    #[error("parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    /// Connection errors (and only those) are worth retrying.
    pub fn is_retriable(&self) -> bool {
        matches!(self, RemoteError::Connection { .. })
    }
}

static CONNECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern, exercised by tests
    let re = Regex::new(
        "(?i)connection timed out|operation timed out|no route to host|host is unreachable\
         |connection refused|network is unreachable|could not resolve hostname\
         |name or service not known",
    )
    .unwrap();
    re
});

/// Does this output look like a transport failure worth retrying?
///
/// Case-insensitive; matches the connection phrases ssh actually
/// prints. Auth failures and remote command errors do not match.
pub fn is_connection_error(output: &str) -> bool {
    CONNECTION_RE.is_match(output)
}

/// Translate raw stderr from a failed remote invocation into the error
/// users see.
///
/// ssh reserves exit status 255 for its own failures, so a 255 with
/// unrecognised stderr is still reported as a connection problem.
pub fn classify(host: &str, stderr: &str, exit_code: i32) -> RemoteError {
    let lower = stderr.to_lowercase();
    if is_connection_error(stderr) {
        return RemoteError::Connection {
            host: host.to_string(),
        };
    }
    if lower.contains("permission denied") {
        return RemoteError::PermissionDenied {
            host: host.to_string(),
        };
    }
    if lower.contains("host key verification") {
        return RemoteError::HostKeyVerification {
            host: host.to_string(),
        };
    }
    if exit_code == 255 {
        return RemoteError::Connection {
            host: host.to_string(),
        };
    }
    let message = stderr.trim();
    let message = if message.is_empty() {
        format!("remote command failed with exit status {exit_code}")
    } else {
        message.to_string()
    };
    RemoteError::Script {
        host: host.to_string(),
        message,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
