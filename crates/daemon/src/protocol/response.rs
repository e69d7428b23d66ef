// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use pin_core::JobStatus;
use serde::{Deserialize, Serialize};

/// Response from the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Status { jobs: usize, live_jobs: usize, sweeps: Vec<String> },

    JobScheduled { id: String },

    /// `requested` is false when the job was already terminal or flagged
    CancelRequested { requested: bool },

    Job {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job: Option<JobStatus>,
    },

    Jobs { jobs: Vec<JobStatus> },

    SweepRan { outcome: String },

    ShuttingDown,

    Error { message: String },
}
