// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic maintenance sweeps driven by the [`Runner`](crate::Runner).

use crate::error::SweepError;
use async_trait::async_trait;
use pin_core::JobId;
use std::fmt;

/// One unit of periodic work. A cycle runs to completion; the runner never
/// runs two cycles of the same sweep at once.
#[async_trait]
pub trait Sweep: Send + Sync + 'static {
    /// Stable name used for logging and manual triggers
    fn name(&self) -> &str;

    async fn run(&self) -> Result<SweepReport, SweepError>;
}

/// Outcome of one cancel sweep cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelReport {
    /// Registered singleton jobs checked against the store
    pub candidates: usize,
    pub canceled: Vec<JobId>,
    pub failed: Vec<JobId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepReport {
    Canceled(CancelReport),
    Purged { removed: usize },
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepReport::Canceled(r) => write!(
                f,
                "{} candidate(s), {} canceled, {} failed",
                r.candidates,
                r.canceled.len(),
                r.failed.len()
            ),
            SweepReport::Purged { removed } => write!(f, "{removed} job(s) purged"),
        }
    }
}
