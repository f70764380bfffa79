// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fake::FakeRemote;

#[test]
fn combined_joins_streams() {
    let out = RemoteOutput {
        stdout: "data".to_string(),
        stderr: "warning".to_string(),
        exit_code: 0,
    };
    assert_eq!(out.combined(), "data\nwarning");

    let out = RemoteOutput {
        stdout: String::new(),
        stderr: "only stderr".to_string(),
        exit_code: 1,
    };
    assert_eq!(out.combined(), "only stderr");
}

#[test]
fn to_error_uses_friendly_translation() {
    let out = RemoteOutput {
        stdout: String::new(),
        stderr: "ssh: connect to host h port 22: Operation timed out".to_string(),
        exit_code: 255,
    };
    assert_eq!(out.to_error("h").to_string(), "SSH connection to h failed");
}

#[tokio::test]
async fn retry_gives_up_after_max_attempts() {
    let remote = FakeRemote::new();
    remote.set_offline("host-a");

    let result = remote
        .run_with_retry_after("host-a", "echo probe", Duration::from_millis(1))
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(remote.run_count("echo probe"), MAX_RETRIES as usize);
}

#[tokio::test]
async fn retry_recovers_when_host_comes_back() {
    let remote = FakeRemote::new();
    remote.respond_output_once(
        "echo probe",
        RemoteOutput {
            stdout: String::new(),
            stderr: "ssh: connect to host host-a port 22: Connection timed out".to_string(),
            exit_code: 255,
        },
    );
    remote.respond("echo probe", "pong");

    let result = remote
        .run_with_retry_after("host-a", "echo probe", Duration::from_millis(1))
        .await
        .unwrap();
    assert!(result.success());
    assert_eq!(result.stdout, "pong");
    assert_eq!(remote.run_count("echo probe"), 2);
}

#[tokio::test]
async fn retry_does_not_retry_remote_script_failures() {
    let remote = FakeRemote::new();
    remote.respond_output(
        "cat missing",
        RemoteOutput {
            stdout: String::new(),
            stderr: "cat: missing: No such file or directory".to_string(),
            exit_code: 1,
        },
    );

    let result = remote
        .run_with_retry_after("host-a", "cat missing", Duration::from_millis(1))
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(remote.run_count("cat missing"), 1);
}

fn copy_count(remote: &FakeRemote) -> usize {
    remote
        .calls()
        .iter()
        .filter(|c| matches!(c, crate::fake::RemoteCall::CopyTo { .. }))
        .count()
}

#[tokio::test]
async fn copy_retries_through_transient_connection_failures() {
    let remote = FakeRemote::new();
    remote.fail_copies(2);

    remote
        .copy_to_after(Path::new("/tmp/f"), "host-a", "~/f", Duration::from_millis(1))
        .await
        .unwrap();
    assert_eq!(copy_count(&remote), 3);
}

#[tokio::test]
async fn copy_gives_up_after_max_attempts() {
    let remote = FakeRemote::new();
    remote.set_offline("host-a");

    let err = remote
        .copy_to_after(Path::new("/tmp/f"), "host-a", "~/f", Duration::from_millis(1))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "SSH connection to host-a failed");
    assert_eq!(copy_count(&remote), MAX_RETRIES as usize);
}

#[tokio::test]
async fn copy_succeeds_first_try_without_retry() {
    let remote = FakeRemote::new();
    remote
        .copy_to(Path::new("/tmp/f"), "host-a", "~/f")
        .await
        .unwrap();
    assert_eq!(copy_count(&remote), 1);
}

#[tokio::test]
async fn retry_does_not_retry_permission_denied() {
    let remote = FakeRemote::new();
    remote.respond_output(
        "true",
        RemoteOutput {
            stdout: String::new(),
            stderr: "host-a: Permission denied (publickey).".to_string(),
            exit_code: 255,
        },
    );

    let result = remote
        .run_with_retry_after("host-a", "true", Duration::from_millis(1))
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(remote.run_count("true"), 1);
}
