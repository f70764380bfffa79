// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle commands: create, restart, kill, remove, prune,
//! start-now, and queue runner control.
//!
//! Every command is database-first: the row transitions before remote
//! side effects, and a failed remote step lands the row in `failed`
//! with the friendly error for the UI.

use rj_core::{meta, paths, Clock, Job};
use rj_remote::subprocess::{PROBE_TIMEOUT, SETUP_TIMEOUT};
use rj_remote::{observe, queue, quote, wrapper, RemoteRunner};
use rj_storage::{JobStore, NewJob};

use crate::error::EngineError;

/// Session tag used when the user does not name one.
const DEFAULT_SESSION_TAG: &str = "run";

/// User-facing inputs for a new job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSpec {
    pub host: String,
    pub working_dir: String,
    pub command: String,
    pub description: Option<String>,
    /// Tmux session tag; defaulted for direct launches.
    pub session_tag: Option<String>,
    /// Target queue. `Some` enqueues instead of launching directly.
    pub queue: Option<String>,
    pub env_vars: Vec<String>,
}

/// Create and launch a tmux-owned job. The row is inserted in
/// `starting`, moves to `running` on a successful launch, or `failed`
/// with the translated error otherwise.
pub async fn create_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    spec: &CreateSpec,
) -> Result<Job, EngineError> {
    let now = clock.epoch_secs();
    let tag = paths::sanitize_tag(
        spec.session_tag
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_SESSION_TAG),
    );
    let new = NewJob {
        host: spec.host.clone(),
        working_dir: spec.working_dir.clone(),
        command: spec.command.clone(),
        description: spec.description.clone(),
        session: Some(tag.clone()),
        queue: None,
        env_vars: spec.env_vars.clone(),
        start_time: now,
    };
    let id = store.record_job_starting(&new)?;
    tracing::info!(job_id = id, host = %spec.host, "creating job");

    match launch_in_tmux(remote, id, now, &tag, &new).await {
        Ok(()) => {
            store.update_job_running(id)?;
            store.get_job(id)?.ok_or(EngineError::JobNotFound(id))
        }
        Err(err) => {
            store.update_failed(id, &err.to_string(), now)?;
            Err(err)
        }
    }
}

/// Remote side of a direct launch: log directory, metadata file, then
/// the wrapped command inside a detached tmux session.
async fn launch_in_tmux<R: RemoteRunner>(
    remote: &R,
    id: i64,
    start_ts: i64,
    tag: &str,
    new: &NewJob,
) -> Result<(), EngineError> {
    let tag = Some(tag);
    let meta_path = paths::meta_path(id, start_ts, tag);
    let metadata = meta::format_metadata(
        id,
        &new.host,
        &new.working_dir,
        &new.command,
        new.description.as_deref(),
        start_ts,
    );
    let setup = format!(
        "mkdir -p {} && {}",
        paths::logs_dir(),
        observe::write_file_command(&meta_path, &metadata),
    );
    let output = remote
        .run_with_timeout(&new.host, &setup, SETUP_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&new.host).into());
    }

    let wrapped = wrapper::build_wrapper_command(&wrapper::WrapperSpec {
        job_id: id,
        working_dir: &new.working_dir,
        command: &new.command,
        log_file: &paths::log_path(id, start_ts, tag),
        status_file: &paths::status_path(id, start_ts, tag),
        pid_file: &paths::pid_path(id, start_ts, tag),
        env_vars: &new.env_vars,
        meta_file: None,
        meta_lines: None,
    });
    let session = paths::tmux_session_name(id, tag);
    let launch = format!("tmux new-session -d -s {session} {}", quote::bash_c(&wrapped));
    let output = remote
        .run_with_timeout(&new.host, &launch, SETUP_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&new.host).into());
    }
    Ok(())
}

/// Queue a job for the host's runner, deploying the runner if needed.
/// The wrapper stamps the metadata file (including the real
/// `start_time`) when the runner eventually picks the job up.
pub async fn enqueue_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    spec: &CreateSpec,
) -> Result<Job, EngineError> {
    // Same rule as session tags: queue names reach tmux session names
    // and unquoted shell interpolations, so they carry no shell
    // metacharacters past this point.
    let queue_name = spec
        .queue
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .map(|q| paths::sanitize_tag(q.trim()))
        .unwrap_or_else(|| rj_core::DEFAULT_QUEUE.to_string());
    let new = NewJob {
        host: spec.host.clone(),
        working_dir: spec.working_dir.clone(),
        command: spec.command.clone(),
        description: spec.description.clone(),
        session: None,
        queue: Some(queue_name.clone()),
        env_vars: spec.env_vars.clone(),
        start_time: 0,
    };
    let id = store.record_job_queued(&new)?;
    let enqueue_ts = clock.epoch_secs();
    tracing::info!(job_id = id, host = %spec.host, queue = %queue_name, "queueing job");

    let result = async {
        queue::ensure_runner(remote, &spec.host, &queue_name).await?;
        let wrapped = queued_wrapper(id, enqueue_ts, &new);
        let append = queue::enqueue_command(&queue_name, id, enqueue_ts, &wrapped);
        let output = remote
            .run_with_timeout(&spec.host, &append, SETUP_TIMEOUT)
            .await?;
        if !output.success() {
            return Err(output.to_error(&spec.host).into());
        }
        Ok::<(), EngineError>(())
    }
    .await;

    match result {
        Ok(()) => store.get_job(id)?.ok_or(EngineError::JobNotFound(id)),
        Err(err) => {
            store.update_failed(id, &err.to_string(), enqueue_ts)?;
            Err(err)
        }
    }
}

/// Wrapper for a queue job: artifacts named by the enqueue timestamp
/// (discovered later by glob), metadata written at pickup.
fn queued_wrapper(id: i64, ts: i64, new: &NewJob) -> String {
    let metadata = meta::format_metadata(
        id,
        &new.host,
        &new.working_dir,
        &new.command,
        new.description.as_deref(),
        0,
    );
    let meta_lines: String = metadata
        .lines()
        .filter(|l| !l.starts_with("start_time:"))
        .collect::<Vec<_>>()
        .join("\n");
    wrapper::build_wrapper_command(&wrapper::WrapperSpec {
        job_id: id,
        working_dir: &new.working_dir,
        command: &new.command,
        log_file: &paths::log_path(id, ts, None),
        status_file: &paths::status_path(id, ts, None),
        pid_file: &paths::pid_path(id, ts, None),
        env_vars: &new.env_vars,
        meta_file: Some(&paths::meta_path(id, ts, None)),
        meta_lines: Some(&meta_lines),
    })
}

/// Restart: re-launch a job's command as a brand-new row. Remote
/// metadata is preferred over DB fields (the file is what actually
/// ran); the old tmux session is killed if still alive. The old row
/// keeps whatever state it was in.
pub async fn restart_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    id: i64,
) -> Result<Job, EngineError> {
    let old = store.get_job(id)?.ok_or(EngineError::JobNotFound(id))?;

    let mut working_dir = old.working_dir.clone();
    let mut command = old.command.clone();
    let mut description = old.description.clone();
    if let Ok(output) = remote
        .run_with_timeout(&old.host, &observe::read_meta_command(id), PROBE_TIMEOUT)
        .await
    {
        if output.success() && !output.stdout.trim().is_empty() {
            let parsed = meta::parse_metadata(&output.stdout);
            if let Some(wd) = parsed.working_dir {
                working_dir = wd;
            }
            if let Some(cmd) = parsed.command {
                command = cmd;
            }
            if parsed.description.is_some() {
                description = parsed.description;
            }
        }
    }

    if old.session.is_some() {
        let session = old.tmux_session();
        let kill = format!("tmux kill-session -t {session} 2>/dev/null; true");
        let _ = remote
            .run_with_timeout(&old.host, &kill, PROBE_TIMEOUT)
            .await;
    }

    let spec = CreateSpec {
        host: old.host.clone(),
        working_dir,
        command,
        description,
        session_tag: old.session.clone(),
        queue: None,
        env_vars: old.env_vars.clone(),
    };
    create_job(store, remote, clock, &spec).await
}

/// Kill: tear down the job's session (or its pid, for runner-owned
/// jobs) and mark the row dead. Kill means dead; a status file the
/// wrapper manages to write afterwards will not resurrect the row.
pub async fn kill_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    id: i64,
) -> Result<(), EngineError> {
    let job = store.get_job(id)?.ok_or(EngineError::JobNotFound(id))?;
    tracing::info!(job_id = id, host = %job.host, "killing job");

    if job.session.is_some() {
        let session = job.tmux_session();
        let kill = format!("tmux kill-session -t {session} 2>/dev/null; true");
        let _ = remote
            .run_with_timeout(&job.host, &kill, PROBE_TIMEOUT)
            .await;
    } else {
        // Runner-owned: drop it from the queue if still pending and
        // kill the wrapper's recorded pid if it got as far as running.
        let queue_name = job.queue_name();
        let _ = remote
            .run_with_timeout(
                &job.host,
                &queue::remove_line_command(queue_name, id),
                PROBE_TIMEOUT,
            )
            .await;
        let pid_kill = format!(
            "pid=$(cat {} 2>/dev/null | head -n1); [ -n \"$pid\" ] && kill \"$pid\" 2>/dev/null; true",
            paths::pid_pattern(id)
        );
        let _ = remote
            .run_with_timeout(&job.host, &pid_kill, PROBE_TIMEOUT)
            .await;
    }

    store.mark_dead(id, clock.epoch_secs())?;
    Ok(())
}

/// Remove: delete the row. No remote cleanup.
pub fn remove_job(store: &JobStore, id: i64) -> Result<(), EngineError> {
    if !store.delete_job(id)? {
        return Err(EngineError::JobNotFound(id));
    }
    Ok(())
}

/// Prune: delete all rows in terminal states. Returns the count.
pub fn prune_jobs(store: &JobStore) -> Result<usize, EngineError> {
    Ok(store.prune_jobs(false, None)?)
}

/// Start a queued job immediately: remove its queue line, launch the
/// wrapped command in its own tmux session, and move the row
/// `queued → running`. Not atomic against a runner mid-pickup.
pub async fn start_job_now<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    id: i64,
) -> Result<Job, EngineError> {
    let job = store.get_job(id)?.ok_or(EngineError::JobNotFound(id))?;
    if job.status != rj_core::JobStatus::Queued {
        return Err(EngineError::NotQueued(id));
    }
    let now = clock.epoch_secs();
    tracing::info!(job_id = id, host = %job.host, "starting queued job now");

    let remove = queue::remove_line_command(job.queue_name(), id);
    let output = remote
        .run_with_timeout(&job.host, &remove, SETUP_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&job.host).into());
    }

    let new = NewJob {
        host: job.host.clone(),
        working_dir: job.working_dir.clone(),
        command: job.command.clone(),
        description: job.description.clone(),
        session: None,
        queue: job.queue.clone(),
        env_vars: job.env_vars.clone(),
        start_time: now,
    };
    let wrapped = queued_wrapper(id, now, &new);
    // No session tag: the row stays runner-shaped and the combined
    // check finds it through its pid file.
    let session = paths::tmux_session_name(id, None);
    let launch = format!("tmux new-session -d -s {session} {}", quote::bash_c(&wrapped));
    let output = remote
        .run_with_timeout(&job.host, &launch, SETUP_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&job.host).into());
    }

    store.update_queued_to_running(id)?;
    store.update_start_time(id, now)?;
    store.get_job(id)?.ok_or(EngineError::JobNotFound(id))
}

/// Ensure a queue runner is serving this queue on the host. Returns
/// `true` when a runner was deployed and started.
pub async fn start_queue<R: RemoteRunner>(
    remote: &R,
    host: &str,
    queue_name: &str,
) -> Result<bool, EngineError> {
    Ok(queue::ensure_runner(remote, host, queue_name).await?)
}

/// Ask the runner to finish its current job and exit.
pub async fn request_queue_stop<R: RemoteRunner>(
    remote: &R,
    host: &str,
    queue_name: &str,
) -> Result<(), EngineError> {
    let output = remote
        .run_with_timeout(host, &queue::stop_command(queue_name), PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(host).into());
    }
    Ok(())
}

/// Withdraw a pending stop request.
pub async fn cancel_queue_stop<R: RemoteRunner>(
    remote: &R,
    host: &str,
    queue_name: &str,
) -> Result<(), EngineError> {
    let output = remote
        .run_with_timeout(host, &queue::clear_stop_command(queue_name), PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(host).into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
