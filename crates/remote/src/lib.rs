// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Remote side of the controller: ssh/scp invocation, shell quoting,
//! probe commands and their parsers, and the queue runner protocol.

pub mod error;
pub mod hostinfo;
pub mod observe;
pub mod procstats;
pub mod queue;
pub mod quote;
pub mod runner;
pub mod subprocess;
pub mod wrapper;

pub use error::{is_connection_error, RemoteError};
pub use observe::{parse_evidence, JobEvidence};
pub use quote::{bash_c, escape_single_quotes};
pub use runner::{RemoteOutput, RemoteRunner, SshRunner};
pub use wrapper::{build_wrapper_command, WrapperSpec};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemote, RemoteCall};
