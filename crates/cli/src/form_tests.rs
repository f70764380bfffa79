// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rj_core::JobStatus;

fn filled() -> JobForm {
    let mut form = JobForm::new();
    form.fields[0] = "host-a".to_string();
    form.fields[1] = "baseline run".to_string();
    form.fields[2] = "python train.py".to_string();
    form.fields[3] = "~/experiments".to_string();
    form.fields[4] = "A=1 B=two,C=3 garbage".to_string();
    form
}

#[test]
fn new_form_defaults_working_dir_to_home() {
    let form = JobForm::new();
    assert_eq!(form.fields[3], "~");
    assert!(!form.is_complete());
}

#[test]
fn focus_wraps_both_ways() {
    let mut form = JobForm::new();
    form.prev_field();
    assert_eq!(form.focus, FIELD_COUNT - 1);
    form.next_field();
    assert_eq!(form.focus, 0);
}

#[test]
fn editing_applies_to_the_focused_field() {
    let mut form = JobForm::new();
    form.push('h');
    form.push('x');
    form.backspace();
    assert_eq!(form.fields[0], "h");
    assert_eq!(form.focused_value(), "h");
}

#[test]
fn to_spec_direct_launch() {
    let spec = filled().to_spec().unwrap();
    assert_eq!(spec.host, "host-a");
    assert_eq!(spec.command, "python train.py");
    assert_eq!(spec.working_dir, "~/experiments");
    assert_eq!(spec.description.as_deref(), Some("baseline run"));
    assert_eq!(spec.session_tag.as_deref(), Some("baseline-run"));
    assert_eq!(spec.queue, None);
    assert_eq!(
        spec.env_vars,
        vec!["A=1".to_string(), "B=two".to_string(), "C=3".to_string()]
    );
}

#[test]
fn to_spec_queued_launch() {
    let mut form = filled();
    form.fields[0] = "host-b@gpu".to_string();
    assert!(form.is_queued());
    let spec = form.to_spec().unwrap();
    assert_eq!(spec.host, "host-b");
    assert_eq!(spec.queue.as_deref(), Some("gpu"));
}

#[test]
fn queue_names_are_sanitized() {
    let mut form = filled();
    form.fields[0] = "host-b@gpu queue's $1".to_string();
    let spec = form.to_spec().unwrap();
    assert_eq!(spec.host, "host-b");
    assert_eq!(spec.queue.as_deref(), Some("gpu-queue-s--1"));
}

#[test]
fn bare_at_sign_means_default_queue() {
    let mut form = filled();
    form.fields[0] = "host-b@".to_string();
    let spec = form.to_spec().unwrap();
    assert_eq!(spec.queue.as_deref(), Some("default"));
}

#[test]
fn incomplete_forms_do_not_build_specs() {
    let mut form = filled();
    form.fields[2].clear();
    assert!(form.to_spec().is_none());
}

#[test]
fn empty_working_dir_falls_back_to_home() {
    let mut form = filled();
    form.fields[3] = "  ".to_string();
    assert_eq!(form.to_spec().unwrap().working_dir, "~");
}

#[test]
fn prefill_reproduces_the_job() {
    let job = rj_core::Job {
        id: 4,
        host: "host-b".to_string(),
        working_dir: "~/w".to_string(),
        command: "true".to_string(),
        description: Some("d".to_string()),
        session: None,
        queue: Some("gpu".to_string()),
        status: JobStatus::Queued,
        start_time: 0,
        end_time: None,
        exit_code: None,
        error: None,
        env_vars: vec!["A=1".to_string()],
    };
    let form = JobForm::prefill(&job);
    assert_eq!(form.fields[0], "host-b@gpu");
    assert_eq!(form.fields[2], "true");
    assert_eq!(form.fields[4], "A=1");
    let spec = form.to_spec().unwrap();
    assert_eq!(spec.queue.as_deref(), Some("gpu"));
}
