// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn facts() -> HostFacts {
    HostFacts {
        arch: "Linux x86_64".to_string(),
        os_version: "6.5.0".to_string(),
        hardware_model: String::new(),
        cpu_model: "AMD EPYC 7763".to_string(),
        cpu_count: 64,
        total_memory: "503Gi".to_string(),
        memory_used: "41Gi".to_string(),
        load_avg: "3.10, 2.80, 2.40".to_string(),
        gpus: vec![GpuInfo {
            index: 0,
            name: "NVIDIA A100-SXM4-40GB".to_string(),
            temperature: "45C".to_string(),
            utilization: "92%".to_string(),
            memory_used: "30123MiB".to_string(),
            memory_total: "40960MiB".to_string(),
        }],
    }
}

#[test]
fn cache_round_trips_gpus_through_json() {
    let cache = CachedHostInfo::from_facts("host-a", &facts(), 1700000000);
    assert_eq!(cache.name, "host-a");
    assert_eq!(cache.last_check, 1700000000);
    let gpus = cache.gpus();
    assert_eq!(gpus.len(), 1);
    assert_eq!(gpus[0].name, "NVIDIA A100-SXM4-40GB");
}

#[test]
fn cache_with_bad_json_yields_no_gpus() {
    let cache = CachedHostInfo {
        gpus_json: "not json".to_string(),
        ..CachedHostInfo::default()
    };
    assert!(cache.gpus().is_empty());
}

#[test]
fn apply_facts_marks_online_and_clears_error() {
    let mut host = Host::named("host-a");
    host.error = Some("old failure".to_string());
    host.apply_facts(&facts(), 1700000500);
    assert_eq!(host.status, HostStatus::Online);
    assert_eq!(host.cpu_count, 64);
    assert_eq!(host.last_check, 1700000500);
    assert_eq!(host.error, None);
}

#[test]
fn offline_preserves_static_fields_and_last_check() {
    let mut host = Host::named("host-a");
    host.apply_facts(&facts(), 1700000500);
    host.mark_offline("SSH connection to host-a failed".to_string());
    assert_eq!(host.status, HostStatus::Offline);
    assert_eq!(host.cpu_model, "AMD EPYC 7763");
    assert_eq!(host.last_check, 1700000500);
    assert!(host.error.is_some());
}

#[test]
fn from_cache_seeds_static_fields() {
    let cache = CachedHostInfo::from_facts("host-b", &facts(), 42);
    let host = Host::from_cache(&cache);
    assert_eq!(host.name, "host-b");
    assert_eq!(host.status, HostStatus::Unknown);
    assert_eq!(host.total_memory, "503Gi");
    assert_eq!(host.gpus.len(), 1);
    assert_eq!(host.last_check, 42);
    // Dynamic fields are unknown until a live probe.
    assert!(host.memory_used.is_empty());
    assert!(host.load_avg.is_empty());
}
