// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pinsetter daemon library: configuration, logging, lifecycle and the
//! socket protocol used by the `pinsetterd` binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
mod listener;
pub mod logging;
pub mod protocol;

pub use lifecycle::{startup, Config, DaemonState, LifecycleError};
