// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pin-core: domain types for the Pinsetter job supervisor and the product
//! data reconciler.

pub mod macros;

pub mod clock;
pub mod dependent;
pub mod error;
pub mod event;
pub mod id;
pub mod job;
pub mod keyed;
pub mod product;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use dependent::DependentIdSet;
pub use error::ReconcileError;
pub use event::JobEvent;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobStatusBuilder;
pub use job::{JobId, JobKey, JobState, JobStatus, TransitionError};
pub use keyed::{Keyed, KeyedCollection};
pub use product::{ContentData, ProductAttribute, ProductContent, ProductData, ProductDataBuilder};
