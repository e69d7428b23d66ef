// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized job state from WAL replay

mod jobs;

use pin_core::{JobEvent, JobId, JobStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Materialized state built from WAL operations
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedState {
    /// job id → status
    pub jobs: HashMap<String, JobStatus>,
}

impl MaterializedState {
    pub fn get_job(&self, id: &str) -> Option<&JobStatus> {
        self.jobs.get(id)
    }

    /// Jobs flagged for cancellation whose id is among `candidates`, oldest
    /// first (ties broken by id).
    pub fn canceled_jobs(&self, candidates: &HashSet<String>) -> Vec<JobStatus> {
        let mut found: Vec<JobStatus> = candidates
            .iter()
            .filter_map(|id| self.jobs.get(id))
            .filter(|job| job.cancel_requested && !job.is_terminal())
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then_with(|| a.id.cmp(&b.id)));
        found
    }

    /// Ids of terminal jobs last updated before `cutoff_ms`, sorted.
    pub fn terminal_before(&self, cutoff_ms: u64) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self
            .jobs
            .values()
            .filter(|job| job.is_terminal() && job.updated_at_ms < cutoff_ms)
            .map(|job| job.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Apply an event to derive state changes.
    ///
    /// Handlers are idempotent: the WAL may be replayed over a snapshot that
    /// already contains some of its events.
    pub fn apply_event(&mut self, event: &JobEvent) {
        jobs::apply(self, event);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
