// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync engine: reconcile job rows with remote evidence.
//!
//! One pass per tick. Per-job failures are swallowed and counted so a
//! flaky host cannot stall the rest of the fleet; a connection error
//! never changes a row. The one ordering rule that matters: a status
//! file beats any liveness evidence, so no job stays `running` after
//! its wrapper wrote an exit code.

use rj_core::{Clock, Job};
use rj_remote::subprocess::PROBE_TIMEOUT;
use rj_remote::{observe, JobEvidence, RemoteRunner};
use rj_storage::JobStore;

use crate::error::EngineError;

/// How far back the revive pass looks for false-dead jobs.
pub const REVIVE_WINDOW_SECS: i64 = 3600;

/// Counters from one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub checked: usize,
    pub updated: usize,
    pub errors: usize,
}

/// Run one full sync pass: running jobs, queued jobs, revive
/// candidates. The caller guards against concurrent passes.
pub async fn sync_tick<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
) -> Result<SyncOutcome, EngineError> {
    let mut outcome = SyncOutcome::default();

    for host in store.list_unique_running_hosts()? {
        for job in store.list_running(&host)? {
            tally(&mut outcome, sync_running_job(store, remote, clock, &job).await, &job);
        }
    }

    for job in store.list_all_queued()? {
        tally(&mut outcome, sync_queued_job(store, remote, clock, &job).await, &job);
    }

    let since = clock.epoch_secs() - REVIVE_WINDOW_SECS;
    for job in store.list_recent_dead_queue_jobs(since)? {
        tally(&mut outcome, revive_job(store, remote, clock, &job).await, &job);
    }

    tracing::info!(
        checked = outcome.checked,
        updated = outcome.updated,
        errors = outcome.errors,
        "sync pass complete"
    );
    Ok(outcome)
}

fn tally(outcome: &mut SyncOutcome, result: Result<bool, EngineError>, job: &Job) {
    outcome.checked += 1;
    match result {
        Ok(true) => outcome.updated += 1,
        Ok(false) => {}
        Err(err) => {
            tracing::warn!(job_id = job.id, host = %job.host, error = %err, "job sync failed");
            outcome.errors += 1;
        }
    }
}

/// Quick check for one `running` job. Returns whether the row changed.
async fn sync_running_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    job: &Job,
) -> Result<bool, EngineError> {
    if job.session.is_some() {
        sync_tmux_job(store, remote, clock, job).await
    } else {
        sync_queue_owned_job(store, remote, clock, job).await
    }
}

/// Tmux-owned: session alive → no change; session gone → the status
/// file decides between completed and dead.
async fn sync_tmux_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    job: &Job,
) -> Result<bool, EngineError> {
    let check = observe::tmux_alive_command(&job.tmux_session());
    let output = remote
        .run_with_timeout(&job.host, &check, PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&job.host).into());
    }
    if output.stdout.trim() == "ALIVE" {
        return Ok(false);
    }

    let status = remote
        .run_with_timeout(&job.host, &observe::read_status_command(job.id), PROBE_TIMEOUT)
        .await?;
    if !status.success() {
        return Err(status.to_error(&job.host).into());
    }
    match status.stdout.trim().parse::<i32>() {
        Ok(code) => Ok(store.record_completion(job.id, code, clock.epoch_secs())?),
        Err(_) => Ok(store.mark_dead(job.id, clock.epoch_secs())?),
    }
}

/// Queue-runner-owned: one combined round trip decides everything.
async fn sync_queue_owned_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    job: &Job,
) -> Result<bool, EngineError> {
    let check = observe::queue_job_check_command(job.id, job.queue_name());
    let output = remote
        .run_with_timeout(&job.host, &check, PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&job.host).into());
    }

    match observe::parse_evidence(&output.stdout) {
        Some(JobEvidence::Exited(code)) => {
            Ok(store.record_completion(job.id, code, clock.epoch_secs())?)
        }
        Some(JobEvidence::Running { start_time }) => {
            if job.start_time == 0 {
                if let Some(ts) = start_time {
                    store.update_start_time(job.id, ts)?;
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Some(JobEvidence::Queued) => {
            // Row says running, queue file still lists it: the runner
            // has not really started it. Leave the row alone and let
            // the pickup settle.
            tracing::debug!(job_id = job.id, "running row still listed in queue file");
            Ok(false)
        }
        Some(JobEvidence::Dead) => Ok(store.mark_dead(job.id, clock.epoch_secs())?),
        Some(JobEvidence::Alive) | None => Ok(false),
    }
}

/// Queued row: a status file means it already ran to completion, a log
/// file means the runner picked it up.
async fn sync_queued_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    job: &Job,
) -> Result<bool, EngineError> {
    let check = observe::queued_job_check_command(job.id);
    let output = remote
        .run_with_timeout(&job.host, &check, PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&job.host).into());
    }

    match observe::parse_evidence(&output.stdout) {
        Some(JobEvidence::Exited(code)) => {
            Ok(store.record_completion(job.id, code, clock.epoch_secs())?)
        }
        Some(JobEvidence::Running { start_time }) => {
            let changed = store.update_queued_to_running(job.id)?;
            if let Some(ts) = start_time {
                store.update_start_time(job.id, ts)?;
            }
            Ok(changed)
        }
        _ => Ok(false),
    }
}

/// Revive pass: a recently-dead queue job showing life goes back to
/// `running`, unless its status file turned up, which wins as always.
async fn revive_job<R: RemoteRunner, C: Clock>(
    store: &JobStore,
    remote: &R,
    clock: &C,
    job: &Job,
) -> Result<bool, EngineError> {
    let check = observe::revive_check_command(job.id, job.queue_name());
    let output = remote
        .run_with_timeout(&job.host, &check, PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(&job.host).into());
    }

    match observe::parse_evidence(&output.stdout) {
        Some(JobEvidence::Exited(code)) => {
            if store.revive_dead(job.id)? {
                tracing::info!(job_id = job.id, code, "dead job had a status file, completing");
                return Ok(store.record_completion(job.id, code, clock.epoch_secs())?);
            }
            Ok(false)
        }
        Some(JobEvidence::Alive) => {
            let revived = store.revive_dead(job.id)?;
            if revived {
                tracing::info!(job_id = job.id, "revived falsely-dead job");
            }
            Ok(revived)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
