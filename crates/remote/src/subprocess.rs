// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::error::RemoteError;

/// Default timeout for observation probes. Short, so that one
/// unreachable host cannot starve a sync tick.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for remote setup commands (mkdir, metadata write,
/// tmux launch).
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for host fact probes, which run several tools.
pub const HOST_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for log tail fetches.
pub const LOG_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into [`RemoteError::Timeout`]. The command is
/// marked `kill_on_drop` so an expired deadline kills the child when
/// the abandoned `output()` future drops, instead of leaving an
/// orphaned ssh hanging on a dead connection.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, RemoteError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(RemoteError::Spawn(format!(
            "{description} failed: {io_err}"
        ))),
        Err(_elapsed) => Err(RemoteError::Timeout {
            description: description.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
