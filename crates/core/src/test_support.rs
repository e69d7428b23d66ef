// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{JobEvent, JobId, JobState, JobStatus};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core types.
pub mod strategies {
    use crate::job::JobState;
    use crate::product::{ContentData, ProductAttribute, ProductContent};
    use proptest::prelude::*;

    pub fn arb_job_state() -> impl Strategy<Value = JobState> {
        prop_oneof![
            Just(JobState::Created),
            Just(JobState::Running),
            Just(JobState::Finished),
            Just(JobState::Canceled),
            Just(JobState::Failed),
        ]
    }

    /// Attributes drawn from a small key space so collisions are common.
    pub fn arb_attribute() -> impl Strategy<Value = ProductAttribute> {
        ("[a-e]", proptest::option::of("[0-3]"))
            .prop_map(|(name, value)| ProductAttribute { name, value })
    }

    pub fn arb_product_content() -> impl Strategy<Value = ProductContent> {
        ("c[0-3]", any::<bool>(), proptest::option::of("v[0-1]")).prop_map(
            |(id, enabled, release_version)| {
                let mut content = ContentData::new(id.clone(), id, "yum", "label", "vendor");
                content.release_version = release_version;
                ProductContent::new(content, enabled)
            },
        )
    }
}

// ── Event factory functions ─────────────────────────────────────────────────

pub fn job_created_event(id: &str, group: &str) -> JobEvent {
    JobEvent::Created { job: JobStatus::builder().id(id).group(group).build() }
}

pub fn transition_event(id: &str, state: JobState) -> JobEvent {
    JobEvent::Transitioned { id: JobId::new(id), state, result: None, at_ms: 2_000_000 }
}

pub fn cancel_requested_event(id: &str) -> JobEvent {
    JobEvent::CancelRequested { id: JobId::new(id), at_ms: 2_000_000 }
}
