// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler kernel: registry of live singleton jobs.
//!
//! [`LocalKernel`] runs each job as a tokio task with its own cancellation
//! token, derived from the kernel's shutdown token. Job status flows through
//! the [`JobCurator`] so every state change lands in the WAL. Shutdown waits
//! for every job task to record its final state.

use crate::error::SchedulerError;
use async_trait::async_trait;
use parking_lot::Mutex;
use pin_core::{Clock, JobId, JobKey, JobState, JobStatus};
use pin_storage::JobCurator;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Scheduler operations the cancel sweep depends on
#[async_trait]
pub trait SchedulerKernel: Clone + Send + Sync + 'static {
    /// Keys of the singleton jobs currently registered
    async fn list_singleton_job_keys(&self) -> Result<HashSet<JobKey>, SchedulerError>;

    /// Signal the job to stop and unregister it
    async fn cancel(&self, id: &JobId, group: &str) -> Result<(), SchedulerError>;
}

struct LiveJob {
    generation: u64,
    token: CancellationToken,
}

struct KernelInner<C: Clock> {
    curator: JobCurator<C>,
    live: Mutex<HashMap<JobKey, LiveJob>>,
    generation: AtomicU64,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl<C: Clock> KernelInner<C> {
    /// Unregister `key` unless it was re-registered by a newer spawn.
    fn release(&self, key: &JobKey, generation: u64) {
        let mut live = self.live.lock();
        if live.get(key).is_some_and(|job| job.generation == generation) {
            live.remove(key);
        }
    }

    fn record(&self, id: &JobId, state: JobState, result: Option<String>) {
        if let Err(e) = self.curator.transition(id, state, result) {
            warn!(job_id = %id, %state, error = %e, "failed to record job state");
        }
    }
}

/// In-process scheduler kernel
pub struct LocalKernel<C: Clock> {
    inner: Arc<KernelInner<C>>,
}

impl<C: Clock> Clone for LocalKernel<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Clock> LocalKernel<C> {
    pub fn new(curator: JobCurator<C>, shutdown: CancellationToken) -> Self {
        Self {
            inner: Arc::new(KernelInner {
                curator,
                live: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                shutdown,
                tasks: TaskTracker::new(),
            }),
        }
    }

    pub fn curator(&self) -> &JobCurator<C> {
        &self.inner.curator
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Record `job` as CREATED, register its key and run `work` to completion
    /// or cancellation.
    ///
    /// `work` yields a result message on success or a failure reason. The
    /// returned handle resolves to the job's terminal state.
    pub fn spawn_singleton<F>(
        &self,
        job: JobStatus,
        work: F,
    ) -> Result<JoinHandle<JobState>, SchedulerError>
    where
        F: Future<Output = Result<String, String>> + Send + 'static,
    {
        if self.is_shut_down() {
            return Err(SchedulerError::Unavailable("kernel is shut down".to_string()));
        }

        let key = job.key();
        let id = job.id.clone();
        let token = self.inner.shutdown.child_token();
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut live = self.inner.live.lock();
            if live.contains_key(&key) {
                return Err(SchedulerError::OperationFailed {
                    job: key,
                    reason: "already scheduled".to_string(),
                });
            }
            live.insert(key.clone(), LiveJob { generation, token: token.clone() });
        }

        // Persist outside the registry lock; the reservation keeps the key
        if let Err(e) = self.inner.curator.create(job) {
            self.inner.release(&key, generation);
            return Err(SchedulerError::OperationFailed { job: key, reason: e.to_string() });
        }

        info!(job_id = %id, group = %key.group, "job scheduled");
        let inner = Arc::clone(&self.inner);
        Ok(self.inner.tasks.spawn(async move {
            inner.record(&id, JobState::Running, None);

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = work => Some(result),
            };

            inner.release(&key, generation);
            let (state, result) = match outcome {
                None => (JobState::Canceled, None),
                Some(Ok(message)) => (JobState::Finished, Some(message)),
                Some(Err(reason)) => (JobState::Failed, Some(reason)),
            };
            inner.record(&id, state, result);
            info!(job_id = %id, group = %key.group, %state, "job finished");
            state
        }))
    }

    /// Cancel every live job, refuse further work and wait until each job
    /// task has recorded its final state.
    pub async fn shutdown(&self) {
        let live = std::mem::take(&mut *self.inner.live.lock());
        info!(live_jobs = live.len(), "shutting down scheduler kernel");
        self.inner.shutdown.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }
}

#[async_trait]
impl<C: Clock> SchedulerKernel for LocalKernel<C> {
    async fn list_singleton_job_keys(&self) -> Result<HashSet<JobKey>, SchedulerError> {
        if self.is_shut_down() {
            return Err(SchedulerError::Unavailable("kernel is shut down".to_string()));
        }
        Ok(self.inner.live.lock().keys().cloned().collect())
    }

    async fn cancel(&self, id: &JobId, group: &str) -> Result<(), SchedulerError> {
        if self.is_shut_down() {
            return Err(SchedulerError::Unavailable("kernel is shut down".to_string()));
        }
        let key = JobKey::new(id.as_str(), group);
        let Some(job) = self.inner.live.lock().remove(&key) else {
            return Err(SchedulerError::OperationFailed { job: key, reason: "job not found".to_string() });
        };
        job.token.cancel();
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::SchedulerKernel;
    use crate::error::SchedulerError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pin_core::{JobId, JobKey};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeKernelState {
        keys: HashSet<JobKey>,
        list_error: Option<String>,
        failing: HashSet<String>,
        list_calls: usize,
        cancels: Vec<JobKey>,
    }

    /// Fake kernel with a fixed key set; records cancel calls
    #[derive(Clone, Default)]
    pub struct FakeKernel {
        inner: Arc<Mutex<FakeKernelState>>,
    }

    impl FakeKernel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn register(&self, name: &str, group: &str) {
            self.inner.lock().keys.insert(JobKey::new(name, group));
        }

        /// Make listing fail with `SchedulerError::Unavailable` until cleared
        pub fn fail_listing(&self, reason: Option<&str>) {
            self.inner.lock().list_error = reason.map(str::to_string);
        }

        /// Make cancels of the named job fail
        pub fn fail_cancel(&self, name: &str) {
            self.inner.lock().failing.insert(name.to_string());
        }

        pub fn list_calls(&self) -> usize {
            self.inner.lock().list_calls
        }

        /// Every cancel attempt, in call order, including failed ones
        pub fn cancel_calls(&self) -> Vec<JobKey> {
            self.inner.lock().cancels.clone()
        }
    }

    #[async_trait]
    impl SchedulerKernel for FakeKernel {
        async fn list_singleton_job_keys(&self) -> Result<HashSet<JobKey>, SchedulerError> {
            let mut inner = self.inner.lock();
            inner.list_calls += 1;
            match &inner.list_error {
                Some(reason) => Err(SchedulerError::Unavailable(reason.clone())),
                None => Ok(inner.keys.clone()),
            }
        }

        async fn cancel(&self, id: &JobId, group: &str) -> Result<(), SchedulerError> {
            let key = JobKey::new(id.as_str(), group);
            let mut inner = self.inner.lock();
            inner.cancels.push(key.clone());
            if inner.failing.contains(id.as_str()) {
                return Err(SchedulerError::OperationFailed {
                    job: key,
                    reason: "injected failure".to_string(),
                });
            }
            inner.keys.remove(&key);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeKernel;

#[cfg(test)]
#[path = "kernel_tests.rs"]
mod tests;
