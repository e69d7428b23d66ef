// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention sweep: deletes finished jobs past the retention window.

use crate::store::JobStore;
use crate::sweep::{Sweep, SweepReport};
use crate::SweepError;
use async_trait::async_trait;
use pin_core::Clock;
use std::time::Duration;
use tracing::info;

/// Top of every hour
pub const DEFAULT_SCHEDULE: &str = "0 0 * * * ?";
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

pub struct PurgeJobsSweep<S: JobStore, C: Clock> {
    store: S,
    clock: C,
    retention: Duration,
}

impl<S: JobStore, C: Clock> PurgeJobsSweep<S, C> {
    pub fn new(store: S, clock: C, retention: Duration) -> Self {
        Self { store, clock, retention }
    }
}

#[async_trait]
impl<S: JobStore, C: Clock> Sweep for PurgeJobsSweep<S, C> {
    fn name(&self) -> &str {
        "purge-jobs"
    }

    async fn run(&self) -> Result<SweepReport, SweepError> {
        let retention_ms = u64::try_from(self.retention.as_millis()).unwrap_or(u64::MAX);
        let cutoff_ms = self.clock.epoch_ms().saturating_sub(retention_ms);
        let removed = self.store.purge_terminal(cutoff_ms).await?;
        if removed > 0 {
            info!(removed, cutoff_ms, "purged expired jobs");
        }
        Ok(SweepReport::Purged { removed })
    }
}

#[cfg(test)]
#[path = "purge_tests.rs"]
mod tests;
