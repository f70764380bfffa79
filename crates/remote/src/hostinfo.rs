// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host fact probe: one remote command, one liberal parser.

use rj_core::{GpuInfo, HostFacts};

/// The single multi-line command that gathers every host fact we show.
///
/// Output is `KEY:value` lines. Works on Linux and macOS; tools that
/// are missing simply contribute no lines. GPU facts come as
/// `GPUNAME:`/`GPUSTAT:` pairs (Linux, via awk over nvidia-smi's
/// default table) or `MACGPU:` lines (macOS system_profiler).
pub const HOST_PROBE: &str = r#"os=$(uname -s)
echo "ARCH:$(uname -sm)"
echo "OS:$(uname -r)"
echo "LOAD:$(uptime | sed 's/.*load average[s]*: *//')"
if [ "$os" = "Darwin" ]; then
  echo "CPUS:$(sysctl -n hw.ncpu)"
  echo "MODEL:$(sysctl -n hw.model)"
  echo "CPUMODEL:$(sysctl -n machdep.cpu.brand_string)"
  total_bytes=$(sysctl -n hw.memsize)
  page=$(sysctl -n hw.pagesize)
  free_pages=$(vm_stat | awk '/Pages free/ {gsub("\\.",""); print $3}')
  used_bytes=$((total_bytes - free_pages * page))
  echo "MEM:$((total_bytes / 1073741824))G:$((used_bytes / 1073741824))G"
  system_profiler SPDisplaysDataType 2>/dev/null | sed -n 's/^ *\(Chipset Model:.*\|VRAM ([^)]*):.*\|Total Number of Cores:.*\|Metal[^:]*:.*\)$/MACGPU:\1/p'
else
  echo "CPUS:$(nproc)"
  echo "CPUMODEL:$(awk -F': ' '/^model name/ {print $2; exit}' /proc/cpuinfo)"
  echo "MEM:$(free -h | awk '/^Mem:/ {print $2 ":" $3}')"
  if command -v nvidia-smi >/dev/null 2>&1; then
    nvidia-smi 2>/dev/null | awk '/^\|[[:space:]]+[0-9]+[[:space:]]+/ { name=""; for (i=3;i<=NF;i++) { if ($i=="On"||$i=="Off") break; name=name (name==""?"":" ") $i } print "GPUNAME:" name; if (getline stat > 0) { n=split(stat, f, /[[:space:]]+/); if (n>=13) print "GPUSTAT:" f[3] " " f[13] " " f[9] " " f[11] } }'
  fi
fi"#;

/// Parse probe output into host facts.
///
/// Line-by-line, split on the first `:`. Unrecognised keys and
/// unparseable values are skipped, so a half-broken probe still yields
/// the facts it did manage to report.
pub fn parse_host_facts(output: &str) -> HostFacts {
    let mut facts = HostFacts::default();
    let mut pending: Option<GpuInfo> = None;
    let mut next_index: u32 = 0;

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "ARCH" => facts.arch = value.to_string(),
            "OS" => facts.os_version = value.to_string(),
            "CPUS" => facts.cpu_count = value.parse().unwrap_or(0),
            "LOAD" => facts.load_avg = value.to_string(),
            "MODEL" => facts.hardware_model = value.to_string(),
            "CPUMODEL" => facts.cpu_model = value.to_string(),
            "MEM" => {
                if let Some((total, used)) = value.split_once(':') {
                    facts.total_memory = total.trim().to_string();
                    facts.memory_used = used.trim().to_string();
                } else {
                    facts.total_memory = value.to_string();
                }
            }
            "GPUNAME" => {
                if let Some(gpu) = pending.take() {
                    facts.gpus.push(gpu);
                }
                pending = Some(GpuInfo {
                    index: next_index,
                    name: value.to_string(),
                    ..GpuInfo::default()
                });
                next_index += 1;
            }
            "GPUSTAT" => {
                if let Some(mut gpu) = pending.take() {
                    let mut fields = value.split_whitespace();
                    gpu.temperature = fields.next().unwrap_or_default().to_string();
                    gpu.utilization = fields.next().unwrap_or_default().to_string();
                    gpu.memory_used = fields.next().unwrap_or_default().to_string();
                    gpu.memory_total = fields.next().unwrap_or_default().to_string();
                    facts.gpus.push(gpu);
                }
            }
            "MACGPU" => apply_macgpu_line(&mut facts, &mut pending, &mut next_index, value),
            _ => {}
        }
    }

    if let Some(gpu) = pending {
        facts.gpus.push(gpu);
    }
    facts
}

/// `MACGPU:` values are themselves `key: value` fragments from
/// system_profiler. `Chipset Model` opens a GPU, `VRAM …` fills its
/// total memory, `Total Number of Cores` decorates the name.
fn apply_macgpu_line(
    facts: &mut HostFacts,
    pending: &mut Option<GpuInfo>,
    next_index: &mut u32,
    value: &str,
) {
    let Some((subkey, subval)) = value.split_once(':') else {
        return;
    };
    let subkey = subkey.trim();
    let subval = subval.trim();
    if subkey == "Chipset Model" {
        if let Some(gpu) = pending.take() {
            facts.gpus.push(gpu);
        }
        *pending = Some(GpuInfo {
            index: *next_index,
            name: subval.to_string(),
            ..GpuInfo::default()
        });
        *next_index += 1;
    } else if subkey.starts_with("VRAM") {
        if let Some(gpu) = pending.as_mut() {
            gpu.memory_total = subval.to_string();
        }
    } else if subkey == "Total Number of Cores" {
        if let Some(gpu) = pending.as_mut() {
            gpu.name = format!("{} ({} cores)", gpu.name, subval);
        }
    }
}

#[cfg(test)]
#[path = "hostinfo_tests.rs"]
mod tests;
