// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn round_trip() {
    let text = format_metadata(
        42,
        "host-a",
        "~/experiments",
        "python train.py --lr 3e-4",
        Some("baseline run"),
        1700000123,
    );
    let meta = parse_metadata(&text);
    assert_eq!(meta.job_id, Some(42));
    assert_eq!(meta.host.as_deref(), Some("host-a"));
    assert_eq!(meta.working_dir.as_deref(), Some("~/experiments"));
    assert_eq!(meta.command.as_deref(), Some("python train.py --lr 3e-4"));
    assert_eq!(meta.description.as_deref(), Some("baseline run"));
    assert_eq!(meta.start_time, Some(1700000123));
}

#[test]
fn values_keep_their_colons() {
    let text = format_metadata(1, "h", "~", "echo a:b:c", None, 0);
    let meta = parse_metadata(&text);
    assert_eq!(meta.command.as_deref(), Some("echo a:b:c"));
}

#[test]
fn newlines_in_values_are_flattened() {
    let text = format_metadata(1, "h", "~", "echo one\necho two", None, 0);
    assert_eq!(text.lines().count(), 5);
    let meta = parse_metadata(&text);
    assert_eq!(meta.command.as_deref(), Some("echo one echo two"));
}

#[test]
fn parser_skips_junk_and_unknown_keys() {
    let meta = parse_metadata("job_id:9\nnot a kv line\nfuture_key:whatever\nstart_time:bogus\n");
    assert_eq!(meta.job_id, Some(9));
    assert_eq!(meta.start_time, None);
    assert_eq!(meta.command, None);
}

#[test]
fn description_is_omitted_when_absent() {
    let text = format_metadata(1, "h", "~", "true", None, 0);
    assert!(!text.contains("description"));
}
