// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process stats probe for the highlighted running job.

use rj_core::{format_ticks, GpuProcStat, ProcessStats};

/// Fallback scheduler tick rate when the probe cannot report one.
pub const DEFAULT_CLK_TCK: u64 = 100;

/// One remote shell that samples everything about a PID in a single
/// round trip: CPU ticks and memory from `/proc`, plus per-GPU
/// utilization and attributed memory from `nvidia-smi`, joined by GPU
/// UUID. The pid file path may contain `~` and stays unquoted.
pub fn stats_command(pid_file: &str) -> String {
    format!(
        r#"PID=$(cat {pid_file} 2>/dev/null | head -n1)
if [ -z "$PID" ]; then echo "NOPID"; exit 0; fi
echo "PID:$PID"
if [ -d /proc/$PID ]; then
  echo "RUNNING:yes"
  echo "CPUTICKS:$(sed 's/^[^)]*) //' /proc/$PID/stat | awk '{{print $12 ":" $13}}')"
  echo "RSS:$(awk '/^VmRSS/ {{print $2}}' /proc/$PID/status)"
  echo "THREADS:$(awk '/^Threads/ {{print $2}}' /proc/$PID/status)"
  echo "MEMTOTAL:$(awk '/^MemTotal/ {{print $2}}' /proc/meminfo)"
  echo "CLK:$(getconf CLK_TCK 2>/dev/null)"
else
  echo "RUNNING:no"
fi
if command -v nvidia-smi >/dev/null 2>&1; then
  gpus=$(nvidia-smi --query-gpu=index,uuid,utilization.gpu --format=csv,noheader,nounits 2>/dev/null)
  printf '%s\n' "$gpus" | awk -F', *' 'NF >= 3 {{print "GPU_UTIL:" $1 ":" $3}}'
  nvidia-smi --query-compute-apps=pid,gpu_uuid,used_memory --format=csv,noheader,nounits 2>/dev/null | awk -F', *' -v pid="$PID" -v gpus="$gpus" 'BEGIN {{n = split(gpus, lines, "\n"); for (i = 1; i <= n; i++) {{split(lines[i], f, /, */); idx[f[2]] = f[1]}}}} $1 == pid {{print "GPU_MEM:" idx[$2] ":" $3}}'
fi"#
    )
}

/// Parse probe output into a sample. Returns the stats and the
/// reported `CLK_TCK` (defaulted when absent) for CPU% computation
/// against the previous sample.
pub fn parse_stats(output: &str, sampled_at: i64) -> (ProcessStats, u64) {
    let mut stats = ProcessStats {
        sampled_at,
        ..ProcessStats::default()
    };
    let mut clk_tck = DEFAULT_CLK_TCK;
    let mut mem_total_kb: Option<u64> = None;
    let mut rss_kb: Option<u64> = None;
    let mut gpu_util: Vec<(u32, u32)> = Vec::new();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            if line.trim() == "NOPID" {
                return (stats, clk_tck);
            }
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "PID" => stats.pid = value.parse().unwrap_or(0),
            "RUNNING" => stats.running = value == "yes",
            "CPUTICKS" => {
                if let Some((u, s)) = value.split_once(':') {
                    stats.utime_ticks = u.trim().parse().unwrap_or(0);
                    stats.stime_ticks = s.trim().parse().unwrap_or(0);
                }
            }
            "RSS" => rss_kb = value.parse().ok(),
            "THREADS" => stats.threads = value.parse().unwrap_or(0),
            "MEMTOTAL" => mem_total_kb = value.parse().ok(),
            "CLK" => clk_tck = value.parse().unwrap_or(DEFAULT_CLK_TCK),
            "GPU_UTIL" => {
                if let Some((idx, pct)) = parse_idx_value(value) {
                    gpu_util.push((idx, pct as u32));
                }
            }
            "GPU_MEM" => {
                if let Some((idx, mib)) = parse_idx_value(value) {
                    stats.gpus.push(GpuProcStat {
                        index: idx,
                        utilization_pct: 0,
                        memory_mib: mib,
                    });
                }
            }
            _ => {}
        }
    }

    for gpu in &mut stats.gpus {
        if let Some(&(_, pct)) = gpu_util.iter().find(|(idx, _)| *idx == gpu.index) {
            gpu.utilization_pct = pct;
        }
    }

    if let Some(kb) = rss_kb {
        stats.mem_rss = format_kb(kb);
        if let Some(total) = mem_total_kb {
            if total > 0 {
                stats.mem_percent = Some(kb as f64 / total as f64 * 100.0);
            }
        }
    }
    stats.cpu_time = format_ticks(stats.utime_ticks + stats.stime_ticks, clk_tck);

    (stats, clk_tck)
}

fn parse_idx_value(value: &str) -> Option<(u32, u64)> {
    let (idx, rest) = value.split_once(':')?;
    Some((idx.trim().parse().ok()?, rest.trim().parse().ok()?))
}

/// Human form of a kB count: `512KiB`, `87.3MiB`, `7.9GiB`.
fn format_kb(kb: u64) -> String {
    if kb < 1024 {
        return format!("{kb}KiB");
    }
    let mib = kb as f64 / 1024.0;
    if mib < 1024.0 {
        return format!("{mib:.1}MiB");
    }
    format!("{:.1}GiB", mib / 1024.0)
}

#[cfg(test)]
#[path = "procstats_tests.rs"]
mod tests;
