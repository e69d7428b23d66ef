// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use pin_core::JobKey;
use pin_storage::StoreError;
use thiserror::Error;

/// Errors from the scheduler kernel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The kernel cannot answer at all (e.g. shut down)
    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
    /// A single-job operation failed
    #[error("scheduler operation failed for {job}: {reason}")]
    OperationFailed { job: JobKey, reason: String },
}

/// Errors that abort a whole sweep cycle
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
