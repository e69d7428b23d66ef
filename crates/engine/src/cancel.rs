// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancel sweep: acts on pending cancel requests.
//!
//! Each cycle lists the singleton jobs the kernel knows about, asks the
//! store which of them have been flagged for cancellation and cancels those
//! one by one. A failure to list or query aborts the cycle; a failure to
//! cancel one job is logged and the rest are still attempted.

use crate::kernel::SchedulerKernel;
use crate::store::JobStore;
use crate::sweep::{CancelReport, Sweep, SweepReport};
use crate::SweepError;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};

/// Every five seconds
pub const DEFAULT_SCHEDULE: &str = "0/5 * * * * ?";

pub struct CancelJobSweep<S: JobStore, K: SchedulerKernel> {
    store: S,
    kernel: K,
}

impl<S: JobStore, K: SchedulerKernel> CancelJobSweep<S, K> {
    pub fn new(store: S, kernel: K) -> Self {
        Self { store, kernel }
    }
}

#[async_trait]
impl<S: JobStore, K: SchedulerKernel> Sweep for CancelJobSweep<S, K> {
    fn name(&self) -> &str {
        "cancel-jobs"
    }

    async fn run(&self) -> Result<SweepReport, SweepError> {
        let keys = self.kernel.list_singleton_job_keys().await?;
        let candidates: HashSet<String> = keys.into_iter().map(|key| key.name).collect();

        let jobs = self.store.find_canceled_jobs(&candidates).await?;

        let mut report = CancelReport { candidates: candidates.len(), ..CancelReport::default() };
        for job in jobs {
            match self.kernel.cancel(&job.id, &job.group).await {
                Ok(()) => {
                    info!(job_id = %job.id, group = %job.group, "canceled job");
                    report.canceled.push(job.id);
                }
                Err(e) => {
                    warn!(job_id = %job.id, group = %job.group, error = %e, "failed to cancel job");
                    report.failed.push(job.id);
                }
            }
        }
        Ok(SweepReport::Canceled(report))
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
