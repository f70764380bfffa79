// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reactive TUI model.
//!
//! `App` owns all interactive state and is only ever touched by the
//! event loop. [`App::update`] consumes one message, mutates the
//! model, and returns the commands to run on worker tasks. Nothing in
//! here blocks.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rj_core::{cpu_percent, Host, HostStatus, Job, JobStatus, ProcessStats};

use crate::form::JobForm;
use crate::input;
use crate::msg::{Cmd, Msg};

/// How long a flash message stays on screen.
pub const FLASH_DURATION: Duration = Duration::from_secs(3);

/// Lines fetched per log refresh.
pub const LOG_TAIL_LINES: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Jobs,
    Hosts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Details,
    Logs,
}

/// Job list filter, cycled with `f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFilter {
    All,
    /// Queued or running (anything still in flight).
    Active,
    /// Completed with exit code 0.
    Success,
    /// Completed with a non-zero exit code.
    Failure,
}

impl JobFilter {
    pub fn next(self) -> Self {
        match self {
            JobFilter::All => JobFilter::Active,
            JobFilter::Active => JobFilter::Success,
            JobFilter::Success => JobFilter::Failure,
            JobFilter::Failure => JobFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobFilter::All => "all",
            JobFilter::Active => "queued/running",
            JobFilter::Success => "completed (success)",
            JobFilter::Failure => "completed (failure)",
        }
    }

    pub fn matches(self, job: &Job) -> bool {
        match self {
            JobFilter::All => true,
            JobFilter::Active => job.status.is_active(),
            JobFilter::Success => job.status == JobStatus::Completed && job.exit_code == Some(0),
            JobFilter::Failure => job.status == JobStatus::Completed && job.exit_code != Some(0),
        }
    }
}

/// Transient status strip at the bottom.
#[derive(Debug, Clone)]
pub struct Flash {
    pub text: String,
    pub error: bool,
    pub expires_at: Instant,
}

/// Modal overlays.
#[derive(Debug, Clone)]
pub enum Modal {
    NewJob(JobForm),
    Progress { title: String, started: Instant },
    Help,
}

/// Log viewport state for the Logs tab.
#[derive(Debug, Clone, Default)]
pub struct LogView {
    pub job_id: Option<i64>,
    pub lines: Vec<String>,
    /// First visible line.
    pub offset: usize,
    /// Stick to the tail until the user scrolls up.
    pub follow: bool,
    /// Last fetch failed; content is stale.
    pub offline: bool,
}

/// Process stat sampling for the highlighted running job. CPU% needs
/// two consecutive samples of the same pid.
#[derive(Debug, Clone, Default)]
pub struct StatsView {
    pub job_id: Option<i64>,
    pub prev: Option<ProcessStats>,
    pub current: Option<ProcessStats>,
    pub clk_tck: u64,
}

impl StatsView {
    fn reset_for(&mut self, job_id: Option<i64>) {
        if self.job_id != job_id {
            *self = StatsView {
                job_id,
                ..StatsView::default()
            };
        }
    }
}

pub struct App {
    pub view: View,
    pub tab: DetailTab,
    pub jobs: Vec<Job>,
    pub filter: JobFilter,
    /// Selected job id; selection follows the job, not the row index.
    pub selected: Option<i64>,
    pub hosts: BTreeMap<String, Host>,
    pub selected_host: usize,
    pub log: LogView,
    pub stats: StatsView,
    pub modal: Option<Modal>,
    pub flash: Option<Flash>,
    pub syncing: bool,
    pub creating_job: bool,
    pub restarting: bool,
    pub should_quit: bool,
    pub size: (u16, u16),
}

impl App {
    pub fn new(seed_hosts: Vec<Host>) -> Self {
        let hosts = seed_hosts
            .into_iter()
            .map(|h| (h.name.clone(), h))
            .collect();
        Self {
            view: View::Jobs,
            tab: DetailTab::Details,
            jobs: Vec::new(),
            filter: JobFilter::All,
            selected: None,
            hosts,
            selected_host: 0,
            log: LogView::default(),
            stats: StatsView::default(),
            modal: None,
            flash: None,
            syncing: false,
            creating_job: false,
            restarting: false,
            should_quit: false,
            size: (80, 24),
        }
    }

    /// Jobs passing the current filter, list order.
    pub fn visible_jobs(&self) -> Vec<&Job> {
        self.jobs.iter().filter(|j| self.filter.matches(j)).collect()
    }

    pub fn selected_job(&self) -> Option<&Job> {
        let id = self.selected?;
        self.jobs.iter().find(|j| j.id == id && self.filter.matches(j))
    }

    pub fn current_host(&self) -> Option<&Host> {
        self.hosts.values().nth(self.selected_host)
    }

    pub fn set_flash(&mut self, text: impl Into<String>, error: bool) {
        self.flash = Some(Flash {
            text: text.into(),
            error,
            expires_at: Instant::now() + FLASH_DURATION,
        });
    }

    /// Move the job selection by delta within the visible list.
    pub fn move_selection(&mut self, delta: i64) {
        let visible = self.visible_jobs();
        if visible.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .and_then(|id| visible.iter().position(|j| j.id == id));
        let next = match current {
            Some(i) => (i as i64 + delta).clamp(0, visible.len() as i64 - 1) as usize,
            None if delta >= 0 => 0,
            None => visible.len() - 1,
        };
        self.select_job(Some(visible[next].id));
    }

    pub fn move_host_selection(&mut self, delta: i64) {
        if self.hosts.is_empty() {
            return;
        }
        let max = self.hosts.len() as i64 - 1;
        self.selected_host = (self.selected_host as i64 + delta).clamp(0, max) as usize;
    }

    /// Change the selected job, clearing per-job panes when it
    /// actually changes.
    pub fn select_job(&mut self, id: Option<i64>) {
        if self.selected == id {
            return;
        }
        self.selected = id;
        self.stats.reset_for(id);
        self.log = LogView {
            job_id: id,
            follow: true,
            ..LogView::default()
        };
    }

    /// Cycle the filter; keep the selection when still visible.
    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        let still_visible = self
            .selected
            .map(|id| {
                self.jobs
                    .iter()
                    .any(|j| j.id == id && self.filter.matches(j))
            })
            .unwrap_or(false);
        if !still_visible {
            let first = self.visible_jobs().first().map(|j| j.id);
            self.select_job(first);
        }
    }

    /// Process one message; returns commands for the workers.
    pub fn update(&mut self, msg: Msg) -> Vec<Cmd> {
        match msg {
            Msg::Key(key) => input::handle_key(self, key),
            Msg::Mouse(mouse) => input::handle_mouse(self, mouse),
            Msg::Resize(w, h) => {
                self.size = (w, h);
                Vec::new()
            }

            Msg::SyncTick => {
                if self.syncing {
                    return Vec::new();
                }
                self.syncing = true;
                vec![Cmd::Sync]
            }
            Msg::LogTick => self.log_tick_cmds(),
            Msg::HostTick => self.host_tick_cmds(),
            Msg::UiTick => {
                if let Some(flash) = &self.flash {
                    if Instant::now() >= flash.expires_at {
                        self.flash = None;
                    }
                }
                Vec::new()
            }

            Msg::JobsRefreshed(Ok(jobs)) => {
                for job in &jobs {
                    self.hosts
                        .entry(job.host.clone())
                        .or_insert_with(|| Host::named(&job.host));
                }
                self.jobs = jobs;
                if self.selected_job().is_none() {
                    let first = self.visible_jobs().first().map(|j| j.id);
                    self.select_job(first);
                }
                Vec::new()
            }
            Msg::JobsRefreshed(Err(err)) => {
                self.set_flash(err, true);
                Vec::new()
            }

            Msg::SyncDone(result) => {
                self.syncing = false;
                match result {
                    Ok(outcome) if outcome.errors > 0 => self.set_flash(
                        format!(
                            "sync: {} checked, {} updated, {} errors",
                            outcome.checked, outcome.updated, outcome.errors
                        ),
                        true,
                    ),
                    Ok(_) => {}
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::LogFetched { job_id, result } => {
                if self.log.job_id == Some(job_id) {
                    match result {
                        Ok(text) => {
                            self.log.lines = text.lines().map(str::to_string).collect();
                            self.log.offline = false;
                            if self.log.follow {
                                self.log.offset = self.log.lines.len();
                            }
                        }
                        // Keep the cached content; just annotate it.
                        Err(_) => self.log.offline = true,
                    }
                }
                Vec::new()
            }

            Msg::StatsFetched { job_id, result } => {
                if self.stats.job_id == Some(job_id) {
                    match result {
                        Ok((mut sample, clk_tck)) => {
                            self.stats.clk_tck = clk_tck;
                            self.stats.prev = self.stats.current.take();
                            if let Some(prev) = &self.stats.prev {
                                sample.cpu_percent = cpu_percent(prev, &sample, clk_tck);
                            }
                            self.stats.current = Some(sample);
                        }
                        Err(_) => {
                            // A missed probe is not a state change.
                        }
                    }
                }
                Vec::new()
            }

            Msg::HostRefreshed(host) => {
                let entry = self
                    .hosts
                    .entry(host.name.clone())
                    .or_insert_with(|| Host::named(&host.name));
                // The queue substatus arrives on its own message.
                let queue = entry.queue.take();
                *entry = *host;
                if entry.queue.is_none() {
                    entry.queue = queue;
                }
                Vec::new()
            }

            Msg::QueueStatusFetched { host, result } => {
                if let Ok(status) = result {
                    if let Some(entry) = self.hosts.get_mut(&host) {
                        entry.queue = Some(status);
                    }
                }
                Vec::new()
            }

            Msg::JobCreated(result) => {
                self.creating_job = false;
                self.close_progress();
                match result {
                    Ok(job) => {
                        let what = if job.status == JobStatus::Queued {
                            "queued on"
                        } else {
                            "started on"
                        };
                        self.set_flash(format!("job {} {what} {}", job.id, job.host), false);
                        self.select_job(Some(job.id));
                    }
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::JobRestarted(result) => {
                self.restarting = false;
                self.close_progress();
                match result {
                    Ok(job) => {
                        self.set_flash(format!("restarted as job {}", job.id), false);
                        self.select_job(Some(job.id));
                    }
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::JobKilled { job_id, result } => {
                match result {
                    Ok(()) => self.set_flash(format!("killed job {job_id}"), false),
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::JobRemoved { job_id, result } => {
                match result {
                    Ok(()) => {
                        if self.selected == Some(job_id) {
                            self.select_job(None);
                        }
                        self.set_flash(format!("removed job {job_id}"), false);
                    }
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::JobStartedNow { job_id, result } => {
                match result {
                    Ok(_) => self.set_flash(format!("started job {job_id}"), false),
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::PruneDone(result) => {
                match result {
                    Ok(count) => self.set_flash(format!("pruned {count} jobs"), false),
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::QueueStarted { host, result } => {
                match result {
                    Ok(true) => self.set_flash(format!("queue runner started on {host}"), false),
                    Ok(false) => self.set_flash(format!("queue runner already active on {host}"), false),
                    Err(err) => self.set_flash(err, true),
                }
                vec![Cmd::RefreshJobs]
            }

            Msg::QueueStopChanged {
                host,
                stopping,
                result,
            } => {
                match result {
                    Ok(()) if stopping => {
                        self.set_flash(format!("queue on {host} will drain and stop"), false)
                    }
                    Ok(()) => self.set_flash(format!("queue stop on {host} withdrawn"), false),
                    Err(err) => self.set_flash(err, true),
                }
                // Re-probe so the stop-pending flag shows promptly.
                let queue = self
                    .queues_on_host(&host)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| rj_core::DEFAULT_QUEUE.to_string());
                vec![Cmd::ProbeQueue { host, queue }]
            }
        }
    }

    /// Per log tick: stats probe for the highlighted running job, plus
    /// a log tail refetch when the Logs tab is showing.
    fn log_tick_cmds(&mut self) -> Vec<Cmd> {
        if self.view != View::Jobs {
            return Vec::new();
        }
        let Some(job) = self.selected_job() else {
            return Vec::new();
        };
        if job.status != JobStatus::Running {
            return Vec::new();
        }
        let (host, job_id) = (job.host.clone(), job.id);
        let mut cmds = vec![Cmd::FetchStats {
            host: host.clone(),
            job_id,
        }];
        if self.tab == DetailTab::Logs {
            cmds.push(Cmd::FetchLog { host, job_id });
        }
        cmds
    }

    /// Per host tick: refresh every host not known-offline, and probe
    /// the queues jobs actually use there. Offline hosts keep their
    /// cached facts until something else succeeds.
    fn host_tick_cmds(&mut self) -> Vec<Cmd> {
        if self.view != View::Hosts {
            return Vec::new();
        }
        let mut cmds = Vec::new();
        let names: Vec<String> = self
            .hosts
            .values()
            .filter(|h| matches!(h.status, HostStatus::Unknown | HostStatus::Online))
            .map(|h| h.name.clone())
            .collect();
        for name in names {
            if let Some(host) = self.hosts.get_mut(&name) {
                host.status = HostStatus::Checking;
            }
            cmds.push(Cmd::RefreshHost { name: name.clone() });
            for queue in self.queues_on_host(&name) {
                cmds.push(Cmd::ProbeQueue {
                    host: name.clone(),
                    queue,
                });
            }
        }
        cmds
    }

    /// Queue names in play on a host (from its jobs), defaulting to
    /// the default queue.
    fn queues_on_host(&self, host: &str) -> Vec<String> {
        let mut queues: Vec<String> = self
            .jobs
            .iter()
            .filter(|j| j.host == host)
            .filter_map(|j| j.queue.clone())
            .collect();
        queues.sort();
        queues.dedup();
        if queues.is_empty() {
            queues.push(rj_core::DEFAULT_QUEUE.to_string());
        }
        queues
    }

    fn close_progress(&mut self) {
        if matches!(self.modal, Some(Modal::Progress { .. })) {
            self.modal = None;
        }
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
