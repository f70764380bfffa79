// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host refresh: probe, cache write-through, offline fallback.

use rj_core::{CachedHostInfo, Host, QueueStatus};
use rj_remote::subprocess::{HOST_PROBE_TIMEOUT, PROBE_TIMEOUT};
use rj_remote::{hostinfo, queue, RemoteRunner};
use rj_storage::JobStore;

use crate::error::EngineError;

/// Probe a host and fold the result into a view.
///
/// On success the cache row is rewritten. On failure the view goes
/// `offline` but keeps the cached static facts and the `last_check`
/// of the last successful contact. The cache is never evicted by a
/// failed probe.
pub async fn refresh_host<R: RemoteRunner>(
    store: &JobStore,
    remote: &R,
    name: &str,
    now: i64,
) -> Host {
    let mut host = match store.load_cached_host(name) {
        Ok(Some(cached)) => Host::from_cache(&cached),
        _ => Host::named(name),
    };

    match remote
        .run_with_timeout(name, hostinfo::HOST_PROBE, HOST_PROBE_TIMEOUT)
        .await
    {
        Ok(output) if output.success() => {
            let facts = hostinfo::parse_host_facts(&output.stdout);
            host.apply_facts(&facts, now);
            if let Err(err) = store.save_cached_host(&CachedHostInfo::from_facts(name, &facts, now))
            {
                tracing::warn!(host = name, error = %err, "host cache write failed");
            }
        }
        Ok(output) => {
            host.mark_offline(output.to_error(name).to_string());
        }
        Err(err) => {
            host.mark_offline(err.to_string());
        }
    }
    host
}

/// Probe the queue runner substatus for a host.
pub async fn probe_queue<R: RemoteRunner>(
    remote: &R,
    host: &str,
    queue_name: &str,
) -> Result<QueueStatus, EngineError> {
    let output = remote
        .run_with_timeout(host, &queue::status_command(queue_name), PROBE_TIMEOUT)
        .await?;
    if !output.success() {
        return Err(output.to_error(host).into());
    }
    Ok(queue::parse_status(&output.stdout))
}

#[cfg(test)]
#[path = "hosts_tests.rs"]
mod tests;
