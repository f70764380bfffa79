// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the remote queue runner protocol.
//!
//! One runner per (host, queue), living in tmux session
//! `rj-queue-{name}`. Its state is three files: the append-only
//! `.queue` list (tab-separated, id first), the `.current` id, and the
//! `.stop` sentinel. The runner script itself is deployed on demand
//! from the constant below.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use rj_core::{paths, QueueStatus};

use crate::error::RemoteError;
use crate::runner::RemoteRunner;
use crate::subprocess::{PROBE_TIMEOUT, SETUP_TIMEOUT};

/// The queue runner deployed to `scripts/queue-runner.sh`.
///
/// Queue lines are `id \t enqueue_ts \t base64(wrapper)`; the encoding
/// keeps arbitrary user commands out of the line format. The wrapper
/// itself writes the status file; the runner only maintains
/// `.current` and honors `.stop`.
pub const RUNNER_SCRIPT: &str = r#"#!/usr/bin/env bash
# rj queue runner: serves one queue file until a stop file appears.
set -u
QUEUE="${1:-default}"
ROOT="$HOME/.cache/remote-jobs"
QUEUE_FILE="$ROOT/queue/$QUEUE.queue"
CURRENT_FILE="$ROOT/queue/$QUEUE.current"
STOP_FILE="$ROOT/queue/$QUEUE.stop"
mkdir -p "$ROOT/queue" "$ROOT/logs"
while :; do
  if [ -f "$STOP_FILE" ]; then break; fi
  line=$(head -n 1 "$QUEUE_FILE" 2>/dev/null || true)
  if [ -z "$line" ]; then sleep 5; continue; fi
  tail -n +2 "$QUEUE_FILE" > "$QUEUE_FILE.tmp" && mv "$QUEUE_FILE.tmp" "$QUEUE_FILE"
  id=$(printf '%s' "$line" | cut -f1)
  enc=$(printf '%s' "$line" | cut -f3)
  printf '%s\n' "$id" > "$CURRENT_FILE"
  printf '%s' "$enc" | base64 -d | bash || true
  : > "$CURRENT_FILE"
done
rm -f "$STOP_FILE"
"#;

/// Probe one queue's runner/current/depth/stop in a single round trip.
pub fn status_command(queue: &str) -> String {
    let session = paths::queue_session_name(queue);
    let queue_file = paths::queue_file(queue);
    let current = paths::current_file(queue);
    let stop = paths::stop_file(queue);
    format!(
        "if tmux has-session -t {session} 2>/dev/null; then echo \"RUNNER:yes\"; else echo \"RUNNER:no\"; fi; \
         echo \"CURRENT:$(cat {current} 2>/dev/null)\"; \
         echo \"DEPTH:$(awk 'NF {{ c++ }} END {{ print c + 0 }}' {queue_file} 2>/dev/null || echo 0)\"; \
         if [ -f {stop} ]; then echo \"STOP:yes\"; else echo \"STOP:no\"; fi"
    )
}

/// Parse `status_command` output. Liberal: missing lines leave
/// defaults.
pub fn parse_status(output: &str) -> QueueStatus {
    let mut status = QueueStatus::default();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "RUNNER" => status.runner_active = value == "yes",
            "CURRENT" => status.current_job = value.parse().ok(),
            "DEPTH" => status.depth = value.parse().unwrap_or(0),
            "STOP" => status.stop_pending = value == "yes",
            _ => {}
        }
    }
    status
}

/// Append a job to the queue file.
pub fn enqueue_command(queue: &str, id: i64, enqueue_ts: i64, wrapper: &str) -> String {
    let encoded = BASE64.encode(wrapper);
    format!(
        "mkdir -p {} && printf '%s\\t%s\\t%s\\n' '{id}' '{enqueue_ts}' '{encoded}' >> {}",
        paths::queue_dir(),
        paths::queue_file(queue),
    )
}

/// Remove a job's line from the queue file, textually.
///
/// The `mv` runs unconditionally: when the removed line was the only
/// one, grep exits non-zero with empty output and the truncated file
/// must still replace the original.
pub fn remove_line_command(queue: &str, id: i64) -> String {
    let file = paths::queue_file(queue);
    format!("grep -v \"^{id}\t\" {file} > {file}.tmp 2>/dev/null; mv {file}.tmp {file}")
}

/// Ask the runner to drain and exit.
pub fn stop_command(queue: &str) -> String {
    format!("touch {}", paths::stop_file(queue))
}

/// Withdraw a pending stop request.
pub fn clear_stop_command(queue: &str) -> String {
    format!("rm -f {}", paths::stop_file(queue))
}

/// Liveness check that always exits zero, so a non-zero ssh status
/// means transport failure rather than "no runner".
pub fn runner_alive_command(queue: &str) -> String {
    let session = paths::queue_session_name(queue);
    format!("tmux has-session -t {session} 2>/dev/null && echo ALIVE || echo ABSENT")
}

/// Ensure a queue runner is active on a host. Returns `true` when a
/// new runner was deployed and started, `false` when one was already
/// serving the queue.
pub async fn ensure_runner<R: RemoteRunner>(
    remote: &R,
    host: &str,
    queue: &str,
) -> Result<bool, RemoteError> {
    let check = remote
        .run_with_timeout(host, &runner_alive_command(queue), PROBE_TIMEOUT)
        .await?;
    if !check.success() {
        return Err(check.to_error(host));
    }
    if check.stdout.trim() == "ALIVE" {
        return Ok(false);
    }

    let script_path = paths::runner_script();
    let session = paths::queue_session_name(queue);
    let deploy = format!(
        "mkdir -p {} {} {} && cat > {script_path} <<'RJEOF'\n{RUNNER_SCRIPT}RJEOF\nchmod +x {script_path} && tmux new-session -d -s {session} {script_path} {queue}",
        paths::logs_dir(),
        paths::queue_dir(),
        paths::scripts_dir(),
    );
    tracing::info!(host, queue, "deploying queue runner");
    let output = remote.run_with_timeout(host, &deploy, SETUP_TIMEOUT).await?;
    if !output.success() {
        return Err(output.to_error(host));
    }
    Ok(true)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
