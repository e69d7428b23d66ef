// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job store seam used by the sweeps.

use async_trait::async_trait;
use pin_core::{Clock, JobStatus};
use pin_storage::{JobCurator, StoreError};
use std::collections::HashSet;

/// Durable job status queries needed by the sweeps
#[async_trait]
pub trait JobStore: Clone + Send + Sync + 'static {
    /// Jobs among `candidates` with a pending cancel request, ordered by
    /// creation time then id.
    async fn find_canceled_jobs(
        &self,
        candidates: &HashSet<String>,
    ) -> Result<Vec<JobStatus>, StoreError>;

    /// Delete terminal jobs last updated before `older_than_ms`.
    async fn purge_terminal(&self, older_than_ms: u64) -> Result<usize, StoreError>;
}

#[async_trait]
impl<C: Clock> JobStore for JobCurator<C> {
    async fn find_canceled_jobs(
        &self,
        candidates: &HashSet<String>,
    ) -> Result<Vec<JobStatus>, StoreError> {
        Ok(JobCurator::find_canceled_jobs(self, candidates))
    }

    async fn purge_terminal(&self, older_than_ms: u64) -> Result<usize, StoreError> {
        JobCurator::purge_terminal(self, older_than_ms)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::JobStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pin_core::JobStatus;
    use pin_storage::StoreError;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeStoreState {
        canceled: Vec<JobStatus>,
        fail: Option<String>,
        queries: Vec<HashSet<String>>,
        purges: Vec<u64>,
        purge_count: usize,
    }

    /// Fake job store returning canned results and recording queries
    #[derive(Clone, Default)]
    pub struct FakeJobStore {
        inner: Arc<Mutex<FakeStoreState>>,
    }

    impl FakeJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Jobs returned by the next `find_canceled_jobs` calls
        pub fn set_canceled(&self, jobs: Vec<JobStatus>) {
            self.inner.lock().canceled = jobs;
        }

        /// Make every call fail with `StoreError::Unavailable` until cleared
        pub fn fail_with(&self, reason: Option<&str>) {
            self.inner.lock().fail = reason.map(str::to_string);
        }

        pub fn set_purge_count(&self, count: usize) {
            self.inner.lock().purge_count = count;
        }

        /// Candidate sets passed to `find_canceled_jobs`, in call order
        pub fn queries(&self) -> Vec<HashSet<String>> {
            self.inner.lock().queries.clone()
        }

        /// Cutoffs passed to `purge_terminal`, in call order
        pub fn purges(&self) -> Vec<u64> {
            self.inner.lock().purges.clone()
        }
    }

    #[async_trait]
    impl JobStore for FakeJobStore {
        async fn find_canceled_jobs(
            &self,
            candidates: &HashSet<String>,
        ) -> Result<Vec<JobStatus>, StoreError> {
            let mut inner = self.inner.lock();
            inner.queries.push(candidates.clone());
            if let Some(reason) = &inner.fail {
                return Err(StoreError::Unavailable(reason.clone()));
            }
            Ok(inner.canceled.iter().filter(|j| candidates.contains(j.id.as_str())).cloned().collect())
        }

        async fn purge_terminal(&self, older_than_ms: u64) -> Result<usize, StoreError> {
            let mut inner = self.inner.lock();
            inner.purges.push(older_than_ms);
            if let Some(reason) = &inner.fail {
                return Err(StoreError::Unavailable(reason.clone()));
            }
            Ok(inner.purge_count)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeJobStore;
