// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status record and state machine.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a scheduled job.
    ///
    /// The same string is the job's name in the scheduler kernel, so a
    /// [`JobKey`] is always `(job id, group)`.
    pub struct JobId("job-");
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Created,
    Running,
    Finished,
    Canceled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Finished | JobState::Canceled | JobState::Failed)
    }

    /// Whether a job in this state may move to `next`.
    pub fn can_transition_to(self, next: JobState) -> bool {
        match self {
            JobState::Created => next != JobState::Created,
            JobState::Running => next.is_terminal(),
            JobState::Finished | JobState::Canceled | JobState::Failed => false,
        }
    }
}

crate::simple_display! {
    JobState {
        Created => "CREATED",
        Running => "RUNNING",
        Finished => "FINISHED",
        Canceled => "CANCELED",
        Failed => "FAILED",
    }
}

/// Name and group a job is registered under in the scheduler kernel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub name: String,
    pub group: String,
}

impl JobKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self { name: name.into(), group: group.into() }
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {id}: illegal transition {from} -> {to}")]
pub struct TransitionError {
    pub id: JobId,
    pub from: JobState,
    pub to: JobState,
}

/// Persisted status of a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    pub group: String,
    pub state: JobState,
    /// Set when someone asked for the job to be canceled; the cancel sweep
    /// acts on it.
    #[serde(default)]
    pub cancel_requested: bool,
    /// What the job operates on (e.g. an owner key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Result message or failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

crate::builder! {
    pub struct JobStatusBuilder => JobStatus {
        into {
            id: JobId = "job-1",
            group: String = "default",
        }
        set {
            state: JobState = JobState::Created,
            cancel_requested: bool = false,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            target: String = None,
            result: String = None,
        }
    }
}

impl JobStatus {
    /// A freshly scheduled job in the CREATED state.
    pub fn new(id: impl Into<JobId>, group: impl Into<String>, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id: id.into(),
            group: group.into(),
            state: JobState::Created,
            cancel_requested: false,
            target: None,
            result: None,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn key(&self) -> JobKey {
        JobKey::new(self.id.as_str(), self.group.as_str())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next`, stamping `updated_at_ms`.
    ///
    /// Re-applying the current state is accepted as a no-op so replayed
    /// transitions stay idempotent.
    pub fn transition(
        &mut self,
        next: JobState,
        result: Option<String>,
        at_ms: u64,
    ) -> Result<(), TransitionError> {
        if self.state == next {
            return Ok(());
        }
        if !self.state.can_transition_to(next) {
            return Err(TransitionError { id: self.id.clone(), from: self.state, to: next });
        }
        self.state = next;
        if result.is_some() {
            self.result = result;
        }
        self.updated_at_ms = at_ms;
        Ok(())
    }

    /// Flag the job for cancellation. Returns false for terminal jobs and
    /// for jobs already flagged.
    pub fn request_cancel(&mut self, at_ms: u64) -> bool {
        if self.is_terminal() || self.cancel_requested {
            return false;
        }
        self.cancel_requested = true;
        self.updated_at_ms = at_ms;
        true
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
