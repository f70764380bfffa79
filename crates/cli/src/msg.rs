// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages and commands for the reactive TUI model.
//!
//! Workers never touch the model: every observation and every
//! lifecycle result comes back through a [`Msg`]. The model never
//! blocks: every side effect leaves as a [`Cmd`] executed on a worker
//! task.

use crossterm::event::{KeyEvent, MouseEvent};

use rj_core::{Host, Job, ProcessStats, QueueStatus};
use rj_engine::{CreateSpec, SyncOutcome};

/// Everything that can reach the event loop.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),

    /// Periodic: drive a sync pass.
    SyncTick,
    /// Periodic: refresh the selected job's log and stats.
    LogTick,
    /// Periodic: refresh host facts and queue substatus.
    HostTick,
    /// Fast periodic: flash expiry and elapsed-timer repaints.
    UiTick,

    JobsRefreshed(Result<Vec<Job>, String>),
    SyncDone(Result<SyncOutcome, String>),
    LogFetched {
        job_id: i64,
        result: Result<String, String>,
    },
    StatsFetched {
        job_id: i64,
        result: Result<(ProcessStats, u64), String>,
    },
    HostRefreshed(Box<Host>),
    QueueStatusFetched {
        host: String,
        result: Result<QueueStatus, String>,
    },

    JobCreated(Result<Job, String>),
    JobRestarted(Result<Job, String>),
    JobKilled {
        job_id: i64,
        result: Result<(), String>,
    },
    JobRemoved {
        job_id: i64,
        result: Result<(), String>,
    },
    JobStartedNow {
        job_id: i64,
        result: Result<Job, String>,
    },
    PruneDone(Result<usize, String>),
    QueueStarted {
        host: String,
        result: Result<bool, String>,
    },
    /// A stop request was written (`stopping: true`) or withdrawn.
    QueueStopChanged {
        host: String,
        stopping: bool,
        result: Result<(), String>,
    },
}

/// Side effects requested by the model, executed off the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    RefreshJobs,
    Sync,
    FetchLog { host: String, job_id: i64 },
    FetchStats { host: String, job_id: i64 },
    RefreshHost { name: String },
    ProbeQueue { host: String, queue: String },
    Create(CreateSpec),
    Enqueue(CreateSpec),
    Restart { job_id: i64 },
    Kill { job_id: i64 },
    Remove { job_id: i64 },
    StartNow { job_id: i64 },
    Prune,
    StartQueue { host: String, queue: String },
    StopQueue { host: String, queue: String },
    CancelQueueStop { host: String, queue: String },
    /// Handled by the main loop, not a worker: leave the TUI.
    Quit,
    /// Handled by the main loop: release the terminal and SIGTSTP.
    Suspend,
    /// Handled by the main loop: release the terminal and attach.
    Attach { host: String, session: String },
}
