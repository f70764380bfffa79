// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The new-job form modal.

use rj_core::Job;
use rj_engine::CreateSpec;

pub const FIELD_COUNT: usize = 5;
pub const FIELD_LABELS: [&str; FIELD_COUNT] =
    ["Host", "Description", "Command", "Working dir", "Env vars"];

const HOST: usize = 0;
const DESCRIPTION: usize = 1;
const COMMAND: usize = 2;
const WORKING_DIR: usize = 3;
const ENV_VARS: usize = 4;

/// Form state: five text fields plus a focus cursor.
///
/// The host field accepts `host` for a direct tmux launch or
/// `host@queue` to enqueue for the host's runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobForm {
    pub fields: [String; FIELD_COUNT],
    pub focus: usize,
}

impl JobForm {
    pub fn new() -> Self {
        let mut form = Self::default();
        form.fields[WORKING_DIR] = "~".to_string();
        form
    }

    /// Prefill from an existing job (edit-and-restart).
    pub fn prefill(job: &Job) -> Self {
        let mut form = Self::new();
        form.fields[HOST] = match &job.queue {
            Some(queue) if job.is_queue_job() => format!("{}@{}", job.host, queue),
            _ => job.host.clone(),
        };
        form.fields[DESCRIPTION] = job.description.clone().unwrap_or_default();
        form.fields[COMMAND] = job.command.clone();
        form.fields[WORKING_DIR] = job.working_dir.clone();
        form.fields[ENV_VARS] = job.env_vars.join(" ");
        form.focus = COMMAND;
        form
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    pub fn push(&mut self, c: char) {
        self.fields[self.focus].push(c);
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus].pop();
    }

    pub fn focused_value(&self) -> &str {
        &self.fields[self.focus]
    }

    /// A submittable form names a host and a command.
    pub fn is_complete(&self) -> bool {
        !self.fields[HOST].trim().is_empty() && !self.fields[COMMAND].trim().is_empty()
    }

    /// Whether this submission targets a queue (`host@queue` form).
    pub fn is_queued(&self) -> bool {
        self.fields[HOST].contains('@')
    }

    /// Build the engine spec. Returns `None` while incomplete.
    pub fn to_spec(&self) -> Option<CreateSpec> {
        if !self.is_complete() {
            return None;
        }
        let host_field = self.fields[HOST].trim();
        // Queue names end up in tmux session names and remote shell
        // commands; sanitize them the same way session tags are.
        let (host, queue) = match host_field.split_once('@') {
            Some((host, queue)) if !queue.trim().is_empty() => (
                host.trim(),
                Some(rj_core::paths::sanitize_tag(queue.trim())),
            ),
            Some((host, _)) => (host.trim(), Some(rj_core::DEFAULT_QUEUE.to_string())),
            None => (host_field, None),
        };
        let description = non_empty(&self.fields[DESCRIPTION]);
        let working_dir = if self.fields[WORKING_DIR].trim().is_empty() {
            "~".to_string()
        } else {
            self.fields[WORKING_DIR].trim().to_string()
        };
        let env_vars: Vec<String> = self.fields[ENV_VARS]
            .split([' ', ','])
            .filter(|s| s.contains('='))
            .map(str::to_string)
            .collect();

        Some(CreateSpec {
            host: host.to_string(),
            working_dir,
            command: self.fields[COMMAND].trim().to_string(),
            session_tag: description.as_deref().map(rj_core::paths::sanitize_tag),
            description,
            queue,
            env_vars,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
