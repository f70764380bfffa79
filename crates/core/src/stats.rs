// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process resource stats sampled from a remote host.

use serde::{Deserialize, Serialize};

/// One GPU's share of a process, joined from `nvidia-smi` queries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpuProcStat {
    pub index: u32,
    /// Device utilization percent at sample time.
    pub utilization_pct: u32,
    /// MiB of device memory attributed to the process.
    pub memory_mib: u64,
}

/// A single sample of one remote process.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessStats {
    pub pid: i32,
    pub running: bool,
    /// Raw scheduler ticks, user and system.
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    /// Formatted cumulative CPU time, e.g. `2m41s`.
    pub cpu_time: String,
    /// Computed from two consecutive samples; absent on the first.
    pub cpu_percent: Option<f64>,
    /// Resident set, human formatted.
    pub mem_rss: String,
    pub mem_percent: Option<f64>,
    pub threads: u32,
    pub gpus: Vec<GpuProcStat>,
    /// UNIX seconds when the sample was taken (local clock).
    pub sampled_at: i64,
}

/// CPU percent between two samples of the same PID.
///
/// `(delta_utime + delta_stime) / CLK_TCK / delta_t * 100`. Numerator units are
/// ticks, the denominator is wall seconds. Returns `None` when the
/// samples cannot be compared (different pid, no elapsed time, counter
/// went backwards after a restart).
pub fn cpu_percent(prev: &ProcessStats, next: &ProcessStats, clk_tck: u64) -> Option<f64> {
    if prev.pid != next.pid || clk_tck == 0 {
        return None;
    }
    let dt = next.sampled_at - prev.sampled_at;
    if dt <= 0 {
        return None;
    }
    let du = next.utime_ticks.checked_sub(prev.utime_ticks)?;
    let ds = next.stime_ticks.checked_sub(prev.stime_ticks)?;
    Some((du + ds) as f64 / clk_tck as f64 / dt as f64 * 100.0)
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
