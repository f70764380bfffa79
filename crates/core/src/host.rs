// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host records: live fleet state and the on-disk cache.

use serde::{Deserialize, Serialize};

/// Reachability of a host, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    #[default]
    Unknown,
    Checking,
    Online,
    Offline,
}

impl std::fmt::Display for HostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HostStatus::Unknown => "unknown",
            HostStatus::Checking => "checking",
            HostStatus::Online => "online",
            HostStatus::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// One GPU as reported by a host probe.
///
/// Memory fields stay strings; vendors disagree on units and we only
/// display them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpuInfo {
    pub index: u32,
    pub name: String,
    pub temperature: String,
    pub utilization: String,
    pub memory_used: String,
    pub memory_total: String,
}

/// Queue runner substatus for one host, from the queue probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    pub runner_active: bool,
    /// Jobs still waiting in the queue file.
    pub depth: u32,
    /// Id the runner is currently executing.
    pub current_job: Option<i64>,
    pub stop_pending: bool,
}

/// Everything a single host probe yields, static and dynamic together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostFacts {
    pub arch: String,
    pub os_version: String,
    pub hardware_model: String,
    pub cpu_model: String,
    pub cpu_count: u32,
    pub total_memory: String,
    pub memory_used: String,
    pub load_avg: String,
    pub gpus: Vec<GpuInfo>,
}

/// Static host facts persisted across controller runs.
///
/// Rewritten on every successful probe; consulted when the host is
/// offline so the UI can keep showing hardware details.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CachedHostInfo {
    pub name: String,
    pub arch: String,
    pub os_version: String,
    pub hardware_model: String,
    pub cpu_model: String,
    pub cpu_count: u32,
    pub total_memory: String,
    /// JSON-encoded `Vec<GpuInfo>`.
    pub gpus_json: String,
    /// UNIX seconds of the last successful probe.
    pub last_check: i64,
}

impl CachedHostInfo {
    pub fn from_facts(name: &str, facts: &HostFacts, now: i64) -> Self {
        Self {
            name: name.to_string(),
            arch: facts.arch.clone(),
            os_version: facts.os_version.clone(),
            hardware_model: facts.hardware_model.clone(),
            cpu_model: facts.cpu_model.clone(),
            cpu_count: facts.cpu_count,
            total_memory: facts.total_memory.clone(),
            gpus_json: serde_json::to_string(&facts.gpus).unwrap_or_else(|_| "[]".to_string()),
            last_check: now,
        }
    }

    pub fn gpus(&self) -> Vec<GpuInfo> {
        serde_json::from_str(&self.gpus_json).unwrap_or_default()
    }
}

/// In-memory view of one host, owned by the TUI event loop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Host {
    pub name: String,
    pub status: HostStatus,
    pub arch: String,
    pub os_version: String,
    pub hardware_model: String,
    pub cpu_model: String,
    pub cpu_count: u32,
    pub total_memory: String,
    pub memory_used: String,
    pub load_avg: String,
    pub gpus: Vec<GpuInfo>,
    pub queue: Option<QueueStatus>,
    /// Last probe error, for the detail pane.
    pub error: Option<String>,
    /// UNIX seconds of the last successful contact.
    pub last_check: i64,
}

impl Host {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Seed a host view from the cache, before any live probe.
    pub fn from_cache(cache: &CachedHostInfo) -> Self {
        Self {
            name: cache.name.clone(),
            status: HostStatus::Unknown,
            arch: cache.arch.clone(),
            os_version: cache.os_version.clone(),
            hardware_model: cache.hardware_model.clone(),
            cpu_model: cache.cpu_model.clone(),
            cpu_count: cache.cpu_count,
            total_memory: cache.total_memory.clone(),
            gpus: cache.gpus(),
            last_check: cache.last_check,
            ..Self::default()
        }
    }

    /// Fold a successful probe into the view.
    pub fn apply_facts(&mut self, facts: &HostFacts, now: i64) {
        self.status = HostStatus::Online;
        self.arch = facts.arch.clone();
        self.os_version = facts.os_version.clone();
        self.hardware_model = facts.hardware_model.clone();
        self.cpu_model = facts.cpu_model.clone();
        self.cpu_count = facts.cpu_count;
        self.total_memory = facts.total_memory.clone();
        self.memory_used = facts.memory_used.clone();
        self.load_avg = facts.load_avg.clone();
        self.gpus = facts.gpus.clone();
        self.error = None;
        self.last_check = now;
    }

    /// Record a failed probe. Static fields and `last_check` are kept;
    /// they describe the last successful contact.
    pub fn mark_offline(&mut self, error: String) {
        self.status = HostStatus::Offline;
        self.error = Some(error);
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
