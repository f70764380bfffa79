// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rj_core::{FakeClock, JobStatus};
use rj_remote::FakeRemote;
use rj_storage::{JobStore, NewJob};

fn setup() -> (JobStore, FakeRemote, FakeClock) {
    let clock = FakeClock::new();
    clock.set_epoch_secs(1_700_000_000);
    (JobStore::open_in_memory().unwrap(), FakeRemote::new(), clock)
}

fn spec(host: &str) -> CreateSpec {
    CreateSpec {
        host: host.to_string(),
        working_dir: "~/experiments".to_string(),
        command: "python train.py --lr 3e-4".to_string(),
        description: Some("baseline".to_string()),
        session_tag: Some("train".to_string()),
        queue: None,
        env_vars: vec!["CUDA_VISIBLE_DEVICES=0".to_string()],
    }
}

#[tokio::test]
async fn create_launches_and_marks_running() {
    let (store, remote, clock) = setup();
    let job = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.start_time, 1_700_000_000);
    assert_eq!(job.session.as_deref(), Some("train"));

    let cmds = remote.commands_for("host-a");
    assert_eq!(cmds.len(), 2);
    // Setup: log dir + metadata heredoc, paths unquoted.
    assert!(cmds[0].starts_with("mkdir -p ~/.cache/remote-jobs/logs && cat > ~/.cache/remote-jobs/logs/"));
    assert!(cmds[0].contains("<<'RJEOF'"));
    assert!(cmds[0].contains("command:python train.py --lr 3e-4"));
    // Launch: detached tmux session running the escaped wrapper.
    assert!(cmds[1].starts_with(&format!(
        "tmux new-session -d -s rj-{}-train bash -c '",
        job.id
    )));
    assert!(cmds[1].contains("tee -a"));
    assert!(cmds[1].contains("export CUDA_VISIBLE_DEVICES"));
}

#[tokio::test]
async fn create_defaults_the_session_tag() {
    let (store, remote, clock) = setup();
    let mut s = spec("host-a");
    s.session_tag = None;
    let job = create_job(&store, &remote, &clock, &s).await.unwrap();
    assert_eq!(job.session.as_deref(), Some("run"));
}

#[tokio::test]
async fn create_on_unreachable_host_fails_the_row() {
    let (store, remote, clock) = setup();
    remote.set_offline("host-a");

    let err = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "SSH connection to host-a failed");

    let jobs = store.list_jobs(None, None, 10).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert_eq!(
        jobs[0].error.as_deref(),
        Some("SSH connection to host-a failed")
    );
}

#[tokio::test]
async fn create_failure_at_launch_step_fails_the_row() {
    let (store, remote, clock) = setup();
    remote.respond_output(
        "tmux new-session",
        rj_remote::RemoteOutput {
            stdout: String::new(),
            stderr: "create session failed".to_string(),
            exit_code: 1,
        },
    );

    let err = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "host-a: create session failed");
    let jobs = store.list_jobs(None, None, 10).unwrap();
    assert_eq!(jobs[0].status, JobStatus::Failed);
}

#[tokio::test]
async fn enqueue_deploys_runner_and_appends() {
    let (store, remote, clock) = setup();
    remote.respond("has-session -t rj-queue-gpu", "ABSENT");

    let mut s = spec("host-b");
    s.queue = Some("gpu".to_string());
    let job = enqueue_job(&store, &remote, &clock, &s).await.unwrap();

    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.start_time, 0);
    assert!(job.session.is_none());
    assert_eq!(job.queue.as_deref(), Some("gpu"));

    let cmds = remote.commands_for("host-b");
    assert!(cmds.iter().any(|c| c.contains("queue-runner.sh")));
    let append = cmds.last().unwrap();
    assert!(append.contains(">> ~/.cache/remote-jobs/queue/gpu.queue"));
}

#[tokio::test]
async fn enqueue_sanitizes_the_queue_name() {
    let (store, remote, clock) = setup();
    let mut s = spec("host-b");
    s.queue = Some("gpu queue".to_string());

    let job = enqueue_job(&store, &remote, &clock, &s).await.unwrap();
    assert_eq!(job.queue.as_deref(), Some("gpu-queue"));

    let cmds = remote.commands_for("host-b");
    assert!(cmds.iter().any(|c| c.contains("rj-queue-gpu-queue")));
    assert!(cmds.last().unwrap().contains("gpu-queue.queue"));
    assert!(!cmds.iter().any(|c| c.contains("gpu queue.queue")));
}

#[tokio::test]
async fn enqueue_reuses_a_live_runner() {
    let (store, remote, clock) = setup();
    remote.respond("has-session -t rj-queue-default", "ALIVE");

    let mut s = spec("host-b");
    s.queue = Some("default".to_string());
    enqueue_job(&store, &remote, &clock, &s).await.unwrap();
    assert_eq!(remote.run_count("queue-runner.sh"), 0);
}

#[tokio::test]
async fn enqueue_failure_fails_the_row() {
    let (store, remote, clock) = setup();
    remote.set_offline("host-b");

    let mut s = spec("host-b");
    s.queue = Some("default".to_string());
    let err = enqueue_job(&store, &remote, &clock, &s).await.unwrap_err();
    assert_eq!(err.to_string(), "SSH connection to host-b failed");
    assert_eq!(
        store.list_jobs(None, None, 10).unwrap()[0].status,
        JobStatus::Failed
    );
}

#[tokio::test]
async fn kill_tmux_job_kills_session_and_marks_dead() {
    let (store, remote, clock) = setup();
    let job = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();

    kill_job(&store, &remote, &clock, job.id).await.unwrap();

    let killed = store.get_job(job.id).unwrap().unwrap();
    assert_eq!(killed.status, JobStatus::Dead);
    assert_eq!(killed.end_time, Some(1_700_000_000));
    assert!(remote
        .commands_for("host-a")
        .iter()
        .any(|c| c.contains(&format!("tmux kill-session -t rj-{}-train", job.id))));
}

#[tokio::test]
async fn kill_queue_job_removes_line_and_kills_pid() {
    let (store, remote, clock) = setup();
    let id = store
        .record_job_queued(&NewJob {
            host: "host-b".to_string(),
            working_dir: "~".to_string(),
            command: "true".to_string(),
            queue: Some("default".to_string()),
            ..NewJob::default()
        })
        .unwrap();
    store.update_queued_to_running(id).unwrap();

    kill_job(&store, &remote, &clock, id).await.unwrap();

    assert_eq!(store.get_job(id).unwrap().unwrap().status, JobStatus::Dead);
    let cmds = remote.commands_for("host-b");
    assert!(cmds.iter().any(|c| c.contains(&format!("grep -v \"^{id}\t\""))));
    assert!(cmds.iter().any(|c| c.contains("kill \"$pid\"")));
}

#[tokio::test]
async fn kill_survives_an_unreachable_host() {
    let (store, remote, clock) = setup();
    let job = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();
    remote.set_offline("host-a");

    kill_job(&store, &remote, &clock, job.id).await.unwrap();
    assert_eq!(
        store.get_job(job.id).unwrap().unwrap().status,
        JobStatus::Dead
    );
}

#[tokio::test]
async fn remove_deletes_the_row_outright() {
    let (store, remote, clock) = setup();
    let job = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();
    remove_job(&store, job.id).unwrap();
    assert!(store.get_job(job.id).unwrap().is_none());
    assert!(matches!(
        remove_job(&store, job.id),
        Err(EngineError::JobNotFound(_))
    ));
}

#[tokio::test]
async fn prune_clears_terminal_rows_only() {
    let (store, remote, clock) = setup();
    let done = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();
    store.record_completion(done.id, 0, 10).unwrap();
    let live = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();

    assert_eq!(prune_jobs(&store).unwrap(), 1);
    assert!(store.get_job(live.id).unwrap().is_some());
}

#[tokio::test]
async fn start_now_removes_the_line_and_launches() {
    let (store, remote, clock) = setup();
    let id = store
        .record_job_queued(&NewJob {
            host: "host-b".to_string(),
            working_dir: "~/w".to_string(),
            command: "python go.py".to_string(),
            queue: Some("default".to_string()),
            ..NewJob::default()
        })
        .unwrap();

    let job = start_job_now(&store, &remote, &clock, id).await.unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.start_time, 1_700_000_000);
    assert!(job.session.is_none());

    let cmds = remote.commands_for("host-b");
    let remove_at = cmds
        .iter()
        .position(|c| c.contains(&format!("grep -v \"^{id}\t\"")))
        .unwrap();
    let launch_at = cmds
        .iter()
        .position(|c| c.starts_with(&format!("tmux new-session -d -s rj-{id} ")))
        .unwrap();
    assert!(remove_at < launch_at);
}

#[tokio::test]
async fn start_now_rejects_non_queued_jobs() {
    let (store, remote, clock) = setup();
    let job = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();
    assert!(matches!(
        start_job_now(&store, &remote, &clock, job.id).await,
        Err(EngineError::NotQueued(_))
    ));
}

#[tokio::test]
async fn restart_prefers_remote_metadata_and_kills_the_old_session() {
    let (store, remote, clock) = setup();
    let old = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();
    // Remote metadata says the command differed from the DB row.
    remote.respond(
        &format!("{}-*.meta", old.id),
        "job_id:1\nworking_dir:~/elsewhere\ncommand:python train.py --resume\nstart_time:5\n",
    );

    let restarted = restart_job(&store, &remote, &clock, old.id).await.unwrap();
    assert_ne!(restarted.id, old.id);
    assert_eq!(restarted.command, "python train.py --resume");
    assert_eq!(restarted.working_dir, "~/elsewhere");
    assert_eq!(restarted.status, JobStatus::Running);

    assert!(remote
        .commands_for("host-a")
        .iter()
        .any(|c| c.contains(&format!("tmux kill-session -t rj-{}-train", old.id))));
}

#[tokio::test]
async fn restart_falls_back_to_db_fields_when_meta_unreadable() {
    let (store, remote, clock) = setup();
    let old = create_job(&store, &remote, &clock, &spec("host-a"))
        .await
        .unwrap();
    remote.set_offline("host-a");

    // Old host unreachable: restart still fails at launch, but the new
    // row carries the DB command.
    let err = restart_job(&store, &remote, &clock, old.id).await.unwrap_err();
    assert_eq!(err.to_string(), "SSH connection to host-a failed");
    let rows = store.list_jobs(None, None, 10).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].command, old.command);
    assert_eq!(rows[0].status, JobStatus::Failed);
}

#[tokio::test]
async fn queue_stop_request_and_cancel() {
    let (_store, remote, _clock) = setup();
    request_queue_stop(&remote, "host-b", "default").await.unwrap();
    cancel_queue_stop(&remote, "host-b", "default").await.unwrap();
    let cmds = remote.commands_for("host-b");
    assert!(cmds[0].contains("touch ~/.cache/remote-jobs/queue/default.stop"));
    assert!(cmds[1].contains("rm -f ~/.cache/remote-jobs/queue/default.stop"));
}
