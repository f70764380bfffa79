// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution on worker tasks.
//!
//! Each command becomes one spawned task whose only way back into the
//! model is a [`Msg`] on the channel. The event loop never blocks on
//! remote I/O or on the store.

use std::sync::Arc;

use tokio::sync::mpsc;

use rj_core::SystemClock;
use rj_remote::SshRunner;
use rj_storage::JobStore;

use crate::app::LOG_TAIL_LINES;
use crate::msg::{Cmd, Msg};

/// Shared handles the workers need. Cheap to clone per task.
#[derive(Clone)]
pub struct TaskCtx {
    pub store: Arc<JobStore>,
    pub remote: SshRunner,
    pub clock: SystemClock,
    pub tx: mpsc::UnboundedSender<Msg>,
}

impl TaskCtx {
    fn send(&self, msg: Msg) {
        let _ = self.tx.send(msg);
    }
}

/// Spawn the worker task for one command. `Quit`, `Suspend`, and
/// `Attach` are handled by the main loop, never here.
pub fn dispatch(ctx: &TaskCtx, cmd: Cmd) {
    let ctx = ctx.clone();
    match cmd {
        Cmd::RefreshJobs => {
            tokio::spawn(async move {
                let result = ctx
                    .store
                    .list_jobs(None, None, 500)
                    .map_err(|e| e.to_string());
                ctx.send(Msg::JobsRefreshed(result));
            });
        }

        Cmd::Sync => {
            tokio::spawn(async move {
                let result = rj_engine::sync_tick(&ctx.store, &ctx.remote, &ctx.clock)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::SyncDone(result));
            });
        }

        Cmd::FetchLog { host, job_id } => {
            tokio::spawn(async move {
                let result =
                    rj_engine::fetch_log_tail(&ctx.remote, &host, job_id, LOG_TAIL_LINES)
                        .await
                        .map_err(|e| e.to_string());
                ctx.send(Msg::LogFetched { job_id, result });
            });
        }

        Cmd::FetchStats { host, job_id } => {
            tokio::spawn(async move {
                use rj_core::Clock as _;
                let now = ctx.clock.epoch_secs();
                let result = rj_engine::fetch_process_stats(&ctx.remote, &host, job_id, now)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::StatsFetched { job_id, result });
            });
        }

        Cmd::RefreshHost { name } => {
            tokio::spawn(async move {
                use rj_core::Clock as _;
                let now = ctx.clock.epoch_secs();
                let host = rj_engine::refresh_host(&ctx.store, &ctx.remote, &name, now).await;
                ctx.send(Msg::HostRefreshed(Box::new(host)));
            });
        }

        Cmd::ProbeQueue { host, queue } => {
            tokio::spawn(async move {
                let result = rj_engine::probe_queue(&ctx.remote, &host, &queue)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::QueueStatusFetched { host, result });
            });
        }

        Cmd::Create(spec) => {
            tokio::spawn(async move {
                let result = rj_engine::create_job(&ctx.store, &ctx.remote, &ctx.clock, &spec)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::JobCreated(result));
            });
        }

        Cmd::Enqueue(spec) => {
            tokio::spawn(async move {
                let result = rj_engine::enqueue_job(&ctx.store, &ctx.remote, &ctx.clock, &spec)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::JobCreated(result));
            });
        }

        Cmd::Restart { job_id } => {
            tokio::spawn(async move {
                let result = rj_engine::restart_job(&ctx.store, &ctx.remote, &ctx.clock, job_id)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::JobRestarted(result));
            });
        }

        Cmd::Kill { job_id } => {
            tokio::spawn(async move {
                let result = rj_engine::kill_job(&ctx.store, &ctx.remote, &ctx.clock, job_id)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::JobKilled { job_id, result });
            });
        }

        Cmd::Remove { job_id } => {
            tokio::spawn(async move {
                let result = rj_engine::remove_job(&ctx.store, job_id).map_err(|e| e.to_string());
                ctx.send(Msg::JobRemoved { job_id, result });
            });
        }

        Cmd::StartNow { job_id } => {
            tokio::spawn(async move {
                let result =
                    rj_engine::start_job_now(&ctx.store, &ctx.remote, &ctx.clock, job_id)
                        .await
                        .map_err(|e| e.to_string());
                ctx.send(Msg::JobStartedNow { job_id, result });
            });
        }

        Cmd::Prune => {
            tokio::spawn(async move {
                let result = rj_engine::prune_jobs(&ctx.store).map_err(|e| e.to_string());
                ctx.send(Msg::PruneDone(result));
            });
        }

        Cmd::StartQueue { host, queue } => {
            tokio::spawn(async move {
                let result = rj_engine::start_queue(&ctx.remote, &host, &queue)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::QueueStarted { host, result });
            });
        }

        Cmd::StopQueue { host, queue } => {
            tokio::spawn(async move {
                let result = rj_engine::request_queue_stop(&ctx.remote, &host, &queue)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::QueueStopChanged {
                    host,
                    stopping: true,
                    result,
                });
            });
        }

        Cmd::CancelQueueStop { host, queue } => {
            tokio::spawn(async move {
                let result = rj_engine::cancel_queue_stop(&ctx.remote, &host, &queue)
                    .await
                    .map_err(|e| e.to_string());
                ctx.send(Msg::QueueStopChanged {
                    host,
                    stopping: false,
                    result,
                });
            });
        }

        Cmd::Quit | Cmd::Suspend | Cmd::Attach { .. } => {
            tracing::debug!("terminal-level command reached the dispatcher");
        }
    }
}
