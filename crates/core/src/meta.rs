// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata file format.
//!
//! Each job leaves a small `.meta` file next to its log: colon-separated
//! `key:value` lines. Values may themselves contain colons (commands
//! often do), so parsing splits on the first colon only.

/// Parsed metadata file contents. Every field is optional; the parser
/// is liberal and callers fall back to database fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub job_id: Option<i64>,
    pub working_dir: Option<String>,
    pub command: Option<String>,
    pub host: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<i64>,
}

/// Render the metadata lines for a job.
///
/// Multi-line commands would corrupt the line format, so newlines in
/// values are flattened to spaces.
pub fn format_metadata(
    job_id: i64,
    host: &str,
    working_dir: &str,
    command: &str,
    description: Option<&str>,
    start_time: i64,
) -> String {
    let mut out = String::new();
    let mut push = |key: &str, value: &str| {
        out.push_str(key);
        out.push(':');
        out.push_str(&value.replace('\n', " "));
        out.push('\n');
    };
    push("job_id", &job_id.to_string());
    push("host", host);
    push("working_dir", working_dir);
    push("command", command);
    if let Some(desc) = description {
        push("description", desc);
    }
    push("start_time", &start_time.to_string());
    out
}

/// Parse metadata file contents. Unknown keys and malformed lines are
/// skipped.
pub fn parse_metadata(s: &str) -> Metadata {
    let mut meta = Metadata::default();
    for line in s.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "job_id" => meta.job_id = value.parse().ok(),
            "working_dir" => meta.working_dir = Some(value.to_string()),
            "command" => meta.command = Some(value.to_string()),
            "host" => meta.host = Some(value.to_string()),
            "description" => meta.description = Some(value.to_string()),
            "start_time" => meta.start_time = value.parse().ok(),
            _ => {}
        }
    }
    meta
}

#[cfg(test)]
#[path = "meta_tests.rs"]
mod tests;
