// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use rj_remote::RemoteError;
use rj_storage::StoreError;
use thiserror::Error;

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("job not found: {0}")]
    JobNotFound(i64),
    #[error("job {0} is not queued")]
    NotQueued(i64),
}
