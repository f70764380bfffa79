// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote path algebra.
//!
//! Maps job identity to the canonical file layout under
//! `~/.cache/remote-jobs/` and to tmux session names. All paths keep
//! their leading `~`; expansion happens on the remote shell, so these
//! strings must never be single-quoted when embedded in a command.

/// Root of all controller state on a remote host.
pub const REMOTE_ROOT: &str = "~/.cache/remote-jobs";

pub fn logs_dir() -> String {
    format!("{REMOTE_ROOT}/logs")
}

pub fn queue_dir() -> String {
    format!("{REMOTE_ROOT}/queue")
}

pub fn scripts_dir() -> String {
    format!("{REMOTE_ROOT}/scripts")
}

/// Deployed queue runner script.
pub fn runner_script() -> String {
    format!("{}/queue-runner.sh", scripts_dir())
}

fn job_stem(id: i64, start_ts: i64, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("{id}-{start_ts}-{tag}"),
        None => format!("{id}-{start_ts}"),
    }
}

fn job_file(id: i64, start_ts: i64, tag: Option<&str>, ext: &str) -> String {
    format!("{}/{}.{ext}", logs_dir(), job_stem(id, start_ts, tag))
}

pub fn log_path(id: i64, start_ts: i64, tag: Option<&str>) -> String {
    job_file(id, start_ts, tag, "log")
}

pub fn status_path(id: i64, start_ts: i64, tag: Option<&str>) -> String {
    job_file(id, start_ts, tag, "status")
}

pub fn pid_path(id: i64, start_ts: i64, tag: Option<&str>) -> String {
    job_file(id, start_ts, tag, "pid")
}

pub fn meta_path(id: i64, start_ts: i64, tag: Option<&str>) -> String {
    job_file(id, start_ts, tag, "meta")
}

/// Glob over all files of one extension for a job, regardless of the
/// start timestamp (unknown a priori for queue-runner jobs).
fn job_pattern(id: i64, ext: &str) -> String {
    format!("{}/{id}-*.{ext}", logs_dir())
}

pub fn log_pattern(id: i64) -> String {
    job_pattern(id, "log")
}

pub fn status_pattern(id: i64) -> String {
    job_pattern(id, "status")
}

pub fn pid_pattern(id: i64) -> String {
    job_pattern(id, "pid")
}

pub fn meta_pattern(id: i64) -> String {
    job_pattern(id, "meta")
}

/// Append-only pending list, one tab-separated entry per line.
pub fn queue_file(queue: &str) -> String {
    format!("{}/{queue}.queue", queue_dir())
}

/// Holds the id of the job the runner is executing, or is absent.
pub fn current_file(queue: &str) -> String {
    format!("{}/{queue}.current", queue_dir())
}

/// Sentinel asking the runner to drain and exit.
pub fn stop_file(queue: &str) -> String {
    format!("{}/{queue}.stop", queue_dir())
}

/// Tmux session name for a job. Unique cluster-wide as long as ids are.
pub fn tmux_session_name(id: i64, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("rj-{id}-{}", sanitize_tag(tag)),
        None => format!("rj-{id}"),
    }
}

/// Tmux session name of the queue runner for a queue.
pub fn queue_session_name(queue: &str) -> String {
    format!("rj-queue-{queue}")
}

/// Tags end up in tmux session names and file names; collapse anything
/// that would break either into dashes.
pub fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
