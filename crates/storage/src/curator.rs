// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status store.
//!
//! [`JobCurator`] is the only writer of job status. Every mutation is
//! recorded as a [`JobEvent`] in the WAL before it is applied to the
//! materialized state, so a restart rebuilds the same view from
//! snapshot + WAL replay.

use crate::snapshot::{load_snapshot, Snapshot, SnapshotError};
use crate::wal::{Wal, WalError};
use crate::MaterializedState;
use parking_lot::Mutex;
use pin_core::{Clock, JobEvent, JobId, JobState, JobStatus, TransitionError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job store unavailable: {0}")]
    Unavailable(String),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    Duplicate(JobId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<WalError> for StoreError {
    fn from(e: WalError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<SnapshotError> for StoreError {
    fn from(e: SnapshotError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Shared handle to the job status store.
#[derive(Clone)]
pub struct JobCurator<C: Clock> {
    state: Arc<Mutex<MaterializedState>>,
    wal: Option<Arc<Mutex<Wal>>>,
    clock: C,
}

impl<C: Clock> JobCurator<C> {
    /// Store without durability, for tests and one-shot tools.
    pub fn in_memory(clock: C) -> Self {
        Self { state: Arc::new(Mutex::new(MaterializedState::default())), wal: None, clock }
    }

    /// Recover from the snapshot at `snapshot_path` (if any) and replay the
    /// WAL entries recorded after it.
    pub fn open(snapshot_path: &Path, wal_path: &Path, clock: C) -> Result<Self, StoreError> {
        let (mut state, processed_seq) = match load_snapshot(snapshot_path)? {
            Some(snapshot) => {
                info!(seq = snapshot.seq, jobs = snapshot.state.jobs.len(), "loaded snapshot");
                (snapshot.state, snapshot.seq)
            }
            None => {
                info!("no snapshot found, starting with empty state");
                (MaterializedState::default(), 0)
            }
        };

        let wal = Wal::open(wal_path, processed_seq)?;
        let entries = wal.entries_after(processed_seq)?;
        let replayed = entries.len();
        for entry in entries {
            state.apply_event(&entry.event);
        }
        if replayed > 0 {
            info!(replayed, after_seq = processed_seq, "replayed WAL events");
        }
        info!(jobs = state.jobs.len(), "recovered job state");

        Ok(Self { state: Arc::new(Mutex::new(state)), wal: Some(Arc::new(Mutex::new(wal))), clock })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Record `event` and apply it to the materialized state.
    ///
    /// The WAL guard is held across the apply so a checkpoint never sees an
    /// event on disk that is missing from the state it snapshots.
    pub fn emit(&self, event: JobEvent) -> Result<(), StoreError> {
        let _wal = match &self.wal {
            Some(wal) => {
                let mut wal = wal.lock();
                wal.append(&event)?;
                wal.flush()?;
                Some(wal)
            }
            None => None,
        };
        tracing::debug!(event = event.name(), job_id = %event.job_id(), "job event");
        self.state.lock().apply_event(&event);
        Ok(())
    }

    /// Register a new job. A live job with the same id is a duplicate; a
    /// terminal one is replaced.
    pub fn create(&self, job: JobStatus) -> Result<JobStatus, StoreError> {
        if let Some(existing) = self.get(&job.id) {
            if !existing.is_terminal() {
                return Err(StoreError::Duplicate(job.id));
            }
        }
        self.emit(JobEvent::Created { job: job.clone() })?;
        Ok(job)
    }

    /// Flag a job for cancellation. Returns false when the job is already
    /// terminal or already flagged.
    pub fn request_cancel(&self, id: &JobId) -> Result<bool, StoreError> {
        let job = self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if job.is_terminal() || job.cancel_requested {
            return Ok(false);
        }
        self.emit(JobEvent::CancelRequested { id: id.clone(), at_ms: self.clock.epoch_ms() })?;
        Ok(true)
    }

    /// Move a job to `next`, validating the state machine first.
    pub fn transition(
        &self,
        id: &JobId,
        next: JobState,
        result: Option<String>,
    ) -> Result<JobStatus, StoreError> {
        let mut job = self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let at_ms = self.clock.epoch_ms();
        job.transition(next, result.clone(), at_ms)?;
        self.emit(JobEvent::Transitioned { id: id.clone(), state: next, result, at_ms })?;
        Ok(job)
    }

    pub fn delete(&self, id: &JobId) -> Result<bool, StoreError> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        self.emit(JobEvent::Deleted { id: id.clone() })?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.state.lock().get_job(id).cloned()
    }

    /// All jobs, oldest first.
    pub fn jobs(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<JobStatus> = self.state.lock().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    /// Non-terminal jobs among `candidates` that have a pending cancel
    /// request.
    pub fn find_canceled_jobs(&self, candidates: &HashSet<String>) -> Vec<JobStatus> {
        self.state.lock().canceled_jobs(candidates)
    }

    /// Delete terminal jobs last updated before `cutoff_ms`. Returns how many
    /// were removed.
    pub fn purge_terminal(&self, cutoff_ms: u64) -> Result<usize, StoreError> {
        let ids = self.state.lock().terminal_before(cutoff_ms);
        for id in &ids {
            self.emit(JobEvent::Deleted { id: id.clone() })?;
        }
        Ok(ids.len())
    }

    /// Save a snapshot at the current WAL position and drop the WAL entries
    /// it covers. Returns the snapshot sequence number.
    pub fn checkpoint(&self, snapshot_path: &Path) -> Result<u64, StoreError> {
        let Some(wal) = &self.wal else {
            return Err(StoreError::Unavailable("in-memory store has no WAL".to_string()));
        };
        let mut wal = wal.lock();
        wal.flush()?;
        let seq = wal.write_seq();
        let state = self.state.lock().clone();
        let size_bytes = Snapshot::new(seq, state).save(snapshot_path)?;
        wal.truncate_before(seq + 1)?;
        info!(seq, size_bytes, "saved snapshot");
        Ok(seq)
    }
}

#[cfg(test)]
#[path = "curator_tests.rs"]
mod tests;
