// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    connect_timeout  = { "ssh: connect to host h port 22: Connection timed out" },
    op_timeout       = { "ssh: connect to host h port 22: Operation timed out" },
    no_route         = { "connect to host h port 22: No route to host" },
    unreachable      = { "Host is unreachable" },
    refused          = { "ssh: connect to host h port 22: Connection refused" },
    net_unreachable  = { "connect: Network is unreachable" },
    resolve          = { "ssh: Could not resolve hostname h: nodename nor servname provided" },
    nss              = { "ssh: h: Name or service not known" },
    uppercase        = { "CONNECTION REFUSED" },
)]
fn connection_phrases_match(stderr: &str) {
    assert!(is_connection_error(stderr), "should match: {stderr}");
}

#[yare::parameterized(
    permission  = { "host-a: Permission denied (publickey)." },
    not_found   = { "bash: command not found" },
    empty       = { "" },
    ordinary    = { "cat: /tmp/x: No such file or directory" },
)]
fn non_connection_output_does_not_match(stderr: &str) {
    assert!(!is_connection_error(stderr), "should not match: {stderr}");
}

#[test]
fn classify_connection() {
    let err = classify("host-a", "ssh: connect to host host-a port 22: Connection refused", 255);
    assert!(matches!(err, RemoteError::Connection { .. }));
    assert_eq!(err.to_string(), "SSH connection to host-a failed");
    assert!(err.is_retriable());
}

#[test]
fn classify_exit_255_without_known_phrase() {
    let err = classify("host-a", "ssh: weird transport failure", 255);
    assert_eq!(err.to_string(), "SSH connection to host-a failed");
}

#[test]
fn classify_permission_denied() {
    let err = classify("host-a", "host-a: Permission denied (publickey,password).", 255);
    assert_eq!(err.to_string(), "SSH permission denied on host-a");
    assert!(!err.is_retriable());
}

#[test]
fn classify_host_key() {
    let err = classify("host-a", "Host key verification failed.", 255);
    assert_eq!(
        err.to_string(),
        "SSH host key verification failed for host-a"
    );
}

#[test]
fn classify_script_error_passes_stderr_through_with_host_tag() {
    let err = classify("host-a", "  mkdir: cannot create directory\n", 1);
    assert_eq!(err.to_string(), "host-a: mkdir: cannot create directory");
}

#[test]
fn classify_empty_stderr_names_the_exit_code() {
    let err = classify("host-a", "", 2);
    assert_eq!(
        err.to_string(),
        "host-a: remote command failed with exit status 2"
    );
}
