// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tmux_check_never_exits_nonzero_for_a_dead_session() {
    let cmd = tmux_alive_command("rj-4-train");
    assert_eq!(
        cmd,
        "tmux has-session -t rj-4-train 2>/dev/null && echo ALIVE || echo DEAD"
    );
}

#[test]
fn combined_queue_check_orders_evidence_correctly() {
    let cmd = queue_job_check_command(7, "default");
    let status_at = cmd.find("7-*.status").unwrap();
    let current_at = cmd.find("default.current").unwrap();
    let queue_at = cmd.find("default.queue").unwrap();
    let ps_at = cmd.find("ps -p").unwrap();
    assert!(status_at < current_at);
    assert!(current_at < queue_at);
    assert!(queue_at < ps_at);
    assert!(cmd.ends_with("echo \"DEAD\""));
    // Queue membership matches the id field exactly, not a prefix.
    assert!(cmd.contains("grep -q \"^7\t\""));
    assert!(!cmd.contains("'~"), "tilde path got quoted:\n{cmd}");
}

#[test]
fn queued_check_prefers_status_over_log() {
    let cmd = queued_job_check_command(3);
    let status_at = cmd.find("3-*.status").unwrap();
    let log_at = cmd.find("3-*.log").unwrap();
    assert!(status_at < log_at);
    assert!(cmd.ends_with("echo \"QUEUED\""));
}

#[test]
fn revive_check_prefers_status_then_current_then_log() {
    let cmd = revive_check_command(9, "gpu");
    let status_at = cmd.find("9-*.status").unwrap();
    let current_at = cmd.find("gpu.current").unwrap();
    let log_at = cmd.find("9-*.log").unwrap();
    assert!(status_at < current_at);
    assert!(current_at < log_at);
}

#[yare::parameterized(
    clean_exit    = { "EXIT:0\n", JobEvidence::Exited(0) },
    failed_exit   = { "EXIT: 137 \n", JobEvidence::Exited(137) },
    queued        = { "QUEUED\n", JobEvidence::Queued },
    dead          = { "DEAD\n", JobEvidence::Dead },
    alive         = { "ALIVE\n", JobEvidence::Alive },
    running_plain = { "RUNNING\n", JobEvidence::Running { start_time: None } },
    running_start = { "RUNNING\nSTART:1700000000\n", JobEvidence::Running { start_time: Some(1700000000) } },
    running_empty_start = { "RUNNING\nSTART:\n", JobEvidence::Running { start_time: None } },
    running_zero_start  = { "RUNNING\nSTART:0\n", JobEvidence::Running { start_time: None } },
)]
fn evidence_parses(output: &str, expected: JobEvidence) {
    assert_eq!(parse_evidence(output), Some(expected));
}

#[yare::parameterized(
    empty     = { "" },
    garbage   = { "something else\n" },
    bad_exit  = { "EXIT:not-a-code\n" },
)]
fn malformed_evidence_is_a_probe_miss(output: &str) {
    assert_eq!(parse_evidence(output), None);
}

#[test]
fn log_tail_uses_the_glob() {
    assert_eq!(
        log_tail_command(5, 500),
        "tail -n 500 ~/.cache/remote-jobs/logs/5-*.log 2>/dev/null"
    );
}

#[test]
fn heredoc_write_keeps_content_literal_and_path_unquoted() {
    let cmd = write_file_command("~/.cache/remote-jobs/logs/5-1.meta", "command:echo $HOME 'x'");
    assert!(cmd.starts_with("cat > ~/.cache/remote-jobs/logs/5-1.meta <<'RJEOF'\n"));
    assert!(cmd.contains("command:echo $HOME 'x'\n"));
    assert!(cmd.ends_with("RJEOF"));
}
