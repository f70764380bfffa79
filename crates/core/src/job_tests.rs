// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn job(status: JobStatus) -> Job {
    Job {
        id: 7,
        host: "host-a".to_string(),
        working_dir: "~/work".to_string(),
        command: "sleep 1".to_string(),
        description: None,
        session: None,
        queue: None,
        status,
        start_time: 0,
        end_time: None,
        exit_code: None,
        error: None,
        env_vars: Vec::new(),
    }
}

#[yare::parameterized(
    completed = { JobStatus::Completed },
    dead      = { JobStatus::Dead },
    failed    = { JobStatus::Failed },
)]
fn terminal_states(status: JobStatus) {
    assert!(status.is_terminal());
    assert!(!status.is_active());
}

#[yare::parameterized(
    pending  = { JobStatus::Pending },
    starting = { JobStatus::Starting },
    queued   = { JobStatus::Queued },
    running  = { JobStatus::Running },
)]
fn active_states(status: JobStatus) {
    assert!(status.is_active());
    assert!(!status.is_terminal());
}

#[test]
fn status_round_trips_through_strings() {
    for status in [
        JobStatus::Pending,
        JobStatus::Starting,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Dead,
        JobStatus::Failed,
    ] {
        assert_eq!(JobStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(JobStatus::parse("zombie"), None);
}

#[test]
fn queue_job_classification() {
    let mut j = job(JobStatus::Queued);
    assert!(j.is_queue_job());
    assert_eq!(j.queue_name(), "default");

    j.queue = Some("gpu".to_string());
    assert_eq!(j.queue_name(), "gpu");

    j.session = Some("train".to_string());
    assert!(!j.is_queue_job());
}

#[test]
fn tmux_session_derives_from_id_and_tag() {
    let mut j = job(JobStatus::Running);
    assert_eq!(j.tmux_session(), "rj-7");
    j.session = Some("train run".to_string());
    assert_eq!(j.tmux_session(), "rj-7-train-run");
}

#[test]
fn elapsed_requires_a_start_time() {
    let mut j = job(JobStatus::Queued);
    assert_eq!(j.elapsed_secs(100), None);

    j.start_time = 50;
    assert_eq!(j.elapsed_secs(110), Some(60));

    j.end_time = Some(80);
    assert_eq!(j.elapsed_secs(110), Some(30));
}
