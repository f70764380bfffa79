// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Evidence probes for the sync engine.
//!
//! Each builder produces a remote command that exits zero and reports
//! its verdict on stdout, so a non-zero ssh status always
//! means transport failure, never a state change. Path arguments may
//! contain `~` and are interpolated unquoted.

use rj_core::paths;

/// What a probe saw on the remote filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvidence {
    /// Status file present: the wrapper wrote this exit code.
    Exited(i32),
    /// Live evidence; `start_time` is lifted from the metadata file
    /// when the probe could read one.
    Running { start_time: Option<i64> },
    /// Still waiting in the queue file.
    Queued,
    /// No evidence of life at all.
    Dead,
    /// Revive probe only: job shows signs of life.
    Alive,
}

/// Check a tmux session without letting "no such session" look like a
/// transport failure.
pub fn tmux_alive_command(session: &str) -> String {
    format!("tmux has-session -t {session} 2>/dev/null && echo ALIVE || echo DEAD")
}

/// Read a job's status file (by glob; the start timestamp may be
/// unknown). Empty output means no status file yet.
pub fn read_status_command(id: i64) -> String {
    format!("cat {} 2>/dev/null | head -n1", paths::status_pattern(id))
}

fn read_meta_start(id: i64) -> String {
    format!(
        "$(awk -F: '/^start_time:/ {{ print $2; exit }}' {} 2>/dev/null)",
        paths::meta_pattern(id)
    )
}

/// The single combined check for a queue-runner-owned job, in
/// completion-precedence order: status file, then `.current`, then the
/// queue line, then the pid, then dead.
pub fn queue_job_check_command(id: i64, queue: &str) -> String {
    let status = paths::status_pattern(id);
    let current = paths::current_file(queue);
    let queue_file = paths::queue_file(queue);
    let pid = paths::pid_pattern(id);
    let start = read_meta_start(id);
    format!(
        "s=$(cat {status} 2>/dev/null | head -n1); \
         if [ -n \"$s\" ]; then echo \"EXIT:$s\"; exit 0; fi; \
         cur=$(cat {current} 2>/dev/null); \
         if [ \"$cur\" = \"{id}\" ]; then echo \"RUNNING\"; echo \"START:{start}\"; exit 0; fi; \
         if grep -q \"^{id}\t\" {queue_file} 2>/dev/null; then echo \"QUEUED\"; exit 0; fi; \
         pid=$(cat {pid} 2>/dev/null | head -n1); \
         if [ -n \"$pid\" ] && ps -p \"$pid\" >/dev/null 2>&1; then echo \"RUNNING\"; echo \"START:{start}\"; exit 0; fi; \
         echo \"DEAD\""
    )
}

/// Check for a job that is still `queued` locally: a status file means
/// it already finished, a log file means the runner picked it up.
pub fn queued_job_check_command(id: i64) -> String {
    let status = paths::status_pattern(id);
    let log = paths::log_pattern(id);
    let start = read_meta_start(id);
    format!(
        "s=$(cat {status} 2>/dev/null | head -n1); \
         if [ -n \"$s\" ]; then echo \"EXIT:$s\"; exit 0; fi; \
         if ls {log} >/dev/null 2>&1; then echo \"RUNNING\"; echo \"START:{start}\"; exit 0; fi; \
         echo \"QUEUED\""
    )
}

/// Revive probe for a recently-dead queue job: completion still wins;
/// otherwise a queue `.current` hit or a surviving log file counts as
/// life.
pub fn revive_check_command(id: i64, queue: &str) -> String {
    let status = paths::status_pattern(id);
    let current = paths::current_file(queue);
    let log = paths::log_pattern(id);
    format!(
        "s=$(cat {status} 2>/dev/null | head -n1); \
         if [ -n \"$s\" ]; then echo \"EXIT:$s\"; exit 0; fi; \
         cur=$(cat {current} 2>/dev/null); \
         if [ \"$cur\" = \"{id}\" ]; then echo \"ALIVE\"; exit 0; fi; \
         if ls {log} >/dev/null 2>&1; then echo \"ALIVE\"; exit 0; fi; \
         echo \"DEAD\""
    )
}

/// Tail a job's log for the Logs tab.
pub fn log_tail_command(id: i64, lines: u32) -> String {
    format!("tail -n {lines} {} 2>/dev/null", paths::log_pattern(id))
}

/// Read a job's metadata file.
pub fn read_meta_command(id: i64) -> String {
    format!("cat {} 2>/dev/null", paths::meta_pattern(id))
}

/// Write a file via quoted heredoc: content stays literal, the path
/// stays unquoted for tilde expansion.
pub fn write_file_command(path: &str, content: &str) -> String {
    let content = if content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    };
    format!("cat > {path} <<'RJEOF'\n{content}RJEOF")
}

/// Parse probe stdout into evidence. `None` when the output matches no
/// known verdict (malformed or empty, treated as a probe miss).
pub fn parse_evidence(output: &str) -> Option<JobEvidence> {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next()?;

    if let Some(code) = first.strip_prefix("EXIT:") {
        return code.trim().parse().ok().map(JobEvidence::Exited);
    }
    match first {
        "RUNNING" => {
            let start_time = lines
                .find_map(|l| l.strip_prefix("START:"))
                .and_then(|s| s.trim().parse().ok())
                .filter(|&ts| ts > 0);
            Some(JobEvidence::Running { start_time })
        }
        "QUEUED" => Some(JobEvidence::Queued),
        "DEAD" => Some(JobEvidence::Dead),
        "ALIVE" => Some(JobEvidence::Alive),
        _ => None,
    }
}

#[cfg(test)]
#[path = "observe_tests.rs"]
mod tests;
