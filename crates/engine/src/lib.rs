// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pinsetter engine: scheduler kernel, periodic sweeps and the trigger
//! runner that drives them.

pub mod cancel;
mod error;
pub mod kernel;
pub mod purge;
mod runner;
pub mod schedule;
mod store;
mod sweep;

pub use cancel::CancelJobSweep;
pub use error::{SchedulerError, SweepError};
pub use kernel::{LocalKernel, SchedulerKernel};
pub use purge::PurgeJobsSweep;
pub use runner::{RunOutcome, Runner};
pub use schedule::{parse_duration, CronExpr, Schedule, ScheduleError};
pub use store::JobStore;
pub use sweep::{CancelReport, Sweep, SweepReport};

#[cfg(any(test, feature = "test-support"))]
pub use kernel::FakeKernel;
#[cfg(any(test, feature = "test-support"))]
pub use store::FakeJobStore;
