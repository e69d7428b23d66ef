// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Caller contract violations on keyed collections and product data.
///
/// Never retried: the same call will fail the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("invalid argument: {0} is empty")]
    InvalidArgument(&'static str),
}
