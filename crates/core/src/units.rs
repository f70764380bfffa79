// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memory size normalisation.

/// Parse a human memory size into MiB.
///
/// Accepts the forms tools actually print: `123MiB`, `123Mi`, `16G`,
/// `80GiB`, `128Gi`, `58.5G`, `2TiB`, bare numbers (already MiB), with
/// optional whitespace before the suffix. Binary multipliers throughout
/// (`G` means GiB the way `free -h` and `nvidia-smi` mean it).
pub fn parse_mib(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let split = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (num_str, suffix) = s.split_at(split);
    let num: f64 = num_str.parse().ok()?;

    let multiplier: f64 = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "m" | "mb" | "mi" | "mib" => 1.0,
        "k" | "kb" | "ki" | "kib" => 1.0 / 1024.0,
        "g" | "gb" | "gi" | "gib" => 1024.0,
        "t" | "tb" | "ti" | "tib" => 1024.0 * 1024.0,
        "b" => 1.0 / (1024.0 * 1024.0),
        _ => return None,
    };

    Some((num * multiplier) as u64)
}

#[cfg(test)]
#[path = "units_tests.rs"]
mod tests;
