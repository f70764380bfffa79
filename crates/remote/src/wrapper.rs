// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wrapper command builder.
//!
//! Every launched job runs inside a generated one-line bash command
//! that leaves three artifacts next to the log: a pid file (written
//! before the user command takes over), the log itself, and, exactly
//! once at exit, a status file holding the decimal exit code. The
//! status file is the sole durable completion signal.

use crate::quote::escape_single_quotes;

/// Inputs for one wrapper command.
#[derive(Debug, Clone)]
pub struct WrapperSpec<'a> {
    pub job_id: i64,
    /// May contain `~`; interpolated unquoted so the remote shell
    /// expands it.
    pub working_dir: &'a str,
    pub command: &'a str,
    pub log_file: &'a str,
    pub status_file: &'a str,
    pub pid_file: &'a str,
    /// `KEY=value` pairs exported literally before the command runs.
    pub env_vars: &'a [String],
    /// When set, the wrapper writes these metadata lines (plus a
    /// launch-time `start_time`) to `meta_file` before anything else.
    /// Used for queue jobs, whose actual start is the runner's pickup.
    pub meta_file: Option<&'a str>,
    pub meta_lines: Option<&'a str>,
}

/// Build the single-line bash command that runs a job.
///
/// The result is raw; callers wrap it in `bash -c '...'` (tmux launch)
/// or encode it for the queue file. Artifact paths are interpolated
/// unquoted to preserve tilde expansion.
pub fn build_wrapper_command(spec: &WrapperSpec<'_>) -> String {
    let log = spec.log_file;
    let status = spec.status_file;
    let pid = spec.pid_file;
    let wd = spec.working_dir;

    let mut parts: Vec<String> = Vec::new();

    if let (Some(meta_file), Some(meta_lines)) = (spec.meta_file, spec.meta_lines) {
        let mut args = String::new();
        for line in meta_lines.lines() {
            args.push_str(&format!(" '{}'", escape_single_quotes(line)));
        }
        parts.push(format!("printf '%s\\n'{args} > {meta_file}"));
        parts.push(format!(
            "printf 'start_time:%s\\n' \"$(date +%s)\" >> {meta_file}"
        ));
    }

    // Log header. $(date) expands at run time, the literal lines are
    // printf'd so quotes in the command survive.
    parts.push(format!("echo \"=== START $(date) ===\" > {log} 2>&1"));
    parts.push(format!(
        "printf '%s\\n' 'job_id: {}' 'cd: {}' 'cmd: {}' '===' >> {log}",
        spec.job_id,
        escape_single_quotes(wd),
        escape_single_quotes(spec.command),
    ));

    parts.push(format!(
        "cd {wd} || {{ printf '%s\\n' 'cd failed: {}' >> {log}; echo 1 > {status}; exit 1; }}",
        escape_single_quotes(wd),
    ));

    for assignment in spec.env_vars {
        let Some((key, value)) = assignment.split_once('=') else {
            continue;
        };
        parts.push(format!("export {key}='{}'", escape_single_quotes(value)));
    }

    // The subshell writes its own pid, then execs into the user
    // command, so the pid file points at the real process from the
    // first moment stats can attach. $BASHPID, not $$: $$ is the
    // parent shell even inside ( ).
    parts.push(format!(
        "( echo $BASHPID > {pid}; exec bash -c '{}' ) 2>&1 | tee -a {log}",
        escape_single_quotes(spec.command),
    ));
    parts.push("rc=${PIPESTATUS[0]}".to_string());
    parts.push(format!("echo \"=== END exit=$rc $(date) ===\" >> {log}"));
    parts.push(format!("echo $rc > {status}"));

    parts.join("; ")
}

#[cfg(test)]
#[path = "wrapper_tests.rs"]
mod tests;
