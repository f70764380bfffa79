// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Elapsed-time formatting for list and detail panes.

/// Format a second count the way the job list shows it: `45s`, `3m10s`,
/// `1h02m`, `2d03h`.
pub fn format_elapsed(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        return format!("{secs}s");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m{:02}s", mins, secs % 60);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h{:02}m", hours, mins % 60);
    }
    format!("{}d{:02}h", hours / 24, hours % 24)
}

/// Format raw scheduler ticks as cumulative CPU time.
pub fn format_ticks(ticks: u64, clk_tck: u64) -> String {
    if clk_tck == 0 {
        return "0s".to_string();
    }
    format_elapsed((ticks / clk_tck) as i64)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
