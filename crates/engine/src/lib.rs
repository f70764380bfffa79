// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj execution engine: sync, lifecycle commands, host refresh.

mod error;
mod fetch;
mod hosts;
mod lifecycle;
mod sync;

pub use error::EngineError;
pub use fetch::{fetch_log_tail, fetch_process_stats};
pub use hosts::{probe_queue, refresh_host};
pub use lifecycle::{
    cancel_queue_stop, create_job, enqueue_job, kill_job, prune_jobs, remove_job,
    request_queue_stop, restart_job, start_job_now, start_queue, CreateSpec,
};
pub use sync::{sync_tick, SyncOutcome, REVIVE_WINDOW_SECS};
