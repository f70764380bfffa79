// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and status state machine.

use crate::paths;
use serde::{Deserialize, Serialize};

/// Queue name used when a queued job does not name one explicitly.
pub const DEFAULT_QUEUE: &str = "default";

/// Lifecycle status of a job.
///
/// Transitions:
/// - create → `Starting` → (`Running` | `Failed`)
/// - `Queued` → `Running` (runner pickup) → (`Completed` | `Dead`)
/// - `Running` → (`Completed` | `Dead` | `Failed`)
/// - `Dead` → `Running` (revive, when live evidence reappears)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Starting,
    Queued,
    Running,
    Completed,
    Dead,
    Failed,
}

impl JobStatus {
    /// Terminal states are never left except by revive (dead only).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Dead | JobStatus::Failed
        )
    }

    /// States that still need remote observation.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Starting | JobStatus::Queued | JobStatus::Running
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Starting => "starting",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Dead => "dead",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "starting" => Some(JobStatus::Starting),
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "dead" => Some(JobStatus::Dead),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked command on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Monotonically increasing row id.
    pub id: i64,
    pub host: String,
    /// Remote working directory; may contain `~` (expanded remotely).
    pub working_dir: String,
    /// The user command, opaque to the controller.
    pub command: String,
    pub description: Option<String>,
    /// Session tag for tmux-owned jobs. `None` means queue-runner-owned.
    pub session: Option<String>,
    /// Queue name for queue-runner jobs.
    pub queue: Option<String>,
    pub status: JobStatus,
    /// UNIX seconds; 0 for queued jobs that have not begun.
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    /// `KEY=value` assignments exported by the wrapper.
    pub env_vars: Vec<String>,
}

impl Job {
    /// Queue-runner-owned jobs carry no session tag.
    pub fn is_queue_job(&self) -> bool {
        self.session.is_none()
    }

    /// Queue this job belongs to, defaulting when unnamed.
    pub fn queue_name(&self) -> &str {
        self.queue.as_deref().unwrap_or(DEFAULT_QUEUE)
    }

    /// Tmux session name for tmux-owned jobs; `None` for queue jobs
    /// that were never started directly.
    pub fn tmux_session(&self) -> String {
        paths::tmux_session_name(self.id, self.session.as_deref())
    }

    /// Seconds the job has been (or was) running, if it ever started.
    pub fn elapsed_secs(&self, now: i64) -> Option<i64> {
        if self.start_time == 0 {
            return None;
        }
        let end = self.end_time.unwrap_or(now);
        Some((end - self.start_time).max(0))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
