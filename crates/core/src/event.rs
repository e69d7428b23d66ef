// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status events.
//!
//! The job store is event-sourced: every mutation is recorded as a
//! [`JobEvent`] in the write-ahead log and then applied to the materialized
//! state.

use crate::job::{JobId, JobState, JobStatus};
use serde::{Deserialize, Serialize};

/// Facts about job status changes.
///
/// Serializes with `{"type": "job:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    #[serde(rename = "job:created")]
    Created { job: JobStatus },

    #[serde(rename = "job:transitioned")]
    Transitioned {
        id: JobId,
        state: JobState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "job:cancel_requested")]
    CancelRequested { id: JobId, at_ms: u64 },

    #[serde(rename = "job:deleted")]
    Deleted { id: JobId },
}

impl JobEvent {
    /// The job this event is about.
    pub fn job_id(&self) -> &JobId {
        match self {
            JobEvent::Created { job } => &job.id,
            JobEvent::Transitioned { id, .. }
            | JobEvent::CancelRequested { id, .. }
            | JobEvent::Deleted { id } => id,
        }
    }

    /// Short event name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::Created { .. } => "job:created",
            JobEvent::Transitioned { .. } => "job:transitioned",
            JobEvent::CancelRequested { .. } => "job:cancel_requested",
            JobEvent::Deleted { .. } => "job:deleted",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
