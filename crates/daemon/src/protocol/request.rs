// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

fn default_group() -> String {
    "async".to_string()
}

/// Request from a client to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Job counts and registered sweeps
    Status,

    /// Run a shell command as a singleton job
    JobSchedule {
        /// Generated when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default = "default_group")]
        group: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        command: String,
    },

    /// Flag a job for cancellation; the cancel sweep carries it out
    JobCancel { id: String },

    JobGet { id: String },

    JobList,

    /// Run a sweep now
    SweepTrigger { sweep: String },

    /// Request daemon shutdown
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
