// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-demand fetches for the detail pane: log tails and process stats.

use rj_core::ProcessStats;
use rj_remote::subprocess::{LOG_FETCH_TIMEOUT, PROBE_TIMEOUT};
use rj_remote::{observe, procstats, RemoteRunner};
use rj_core::paths;

use crate::error::EngineError;

/// Fetch the last `lines` lines of a job's log.
pub async fn fetch_log_tail<R: RemoteRunner>(
    remote: &R,
    host: &str,
    job_id: i64,
    lines: u32,
) -> Result<String, EngineError> {
    let output = remote
        .run_with_timeout(host, &observe::log_tail_command(job_id, lines), LOG_FETCH_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(host).into());
    }
    Ok(output.stdout)
}

/// Sample a job's process stats. Returns the sample and the remote
/// `CLK_TCK` for CPU% computation against the previous sample.
pub async fn fetch_process_stats<R: RemoteRunner>(
    remote: &R,
    host: &str,
    job_id: i64,
    now: i64,
) -> Result<(ProcessStats, u64), EngineError> {
    let command = procstats::stats_command(&paths::pid_pattern(job_id));
    let output = remote
        .run_with_timeout(host, &command, PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(host).into());
    }
    Ok(procstats::parse_stats(&output.stdout, now))
}
