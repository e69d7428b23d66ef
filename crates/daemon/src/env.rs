// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use pin_engine::{cancel, parse_duration, purge, Schedule};

use crate::lifecycle::LifecycleError;

/// Resolve state directory:
/// PINSETTER_STATE_DIR > XDG_STATE_HOME/pinsetter > ~/.local/state/pinsetter
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("PINSETTER_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("pinsetter"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/pinsetter"))
}

/// Cancel sweep schedule (default every five seconds)
pub fn cancel_job_schedule() -> Result<Schedule, LifecycleError> {
    schedule_var("PINSETTER_CANCEL_JOB_SCHEDULE", cancel::DEFAULT_SCHEDULE)
}

/// Retention sweep schedule (default hourly)
pub fn purge_schedule() -> Result<Schedule, LifecycleError> {
    schedule_var("PINSETTER_PURGE_SCHEDULE", purge::DEFAULT_SCHEDULE)
}

/// How long terminal jobs are kept (default 24h)
pub fn job_retention() -> Result<Duration, LifecycleError> {
    match std::env::var("PINSETTER_JOB_RETENTION") {
        Ok(value) => parse_duration(&value).map_err(|reason| LifecycleError::InvalidConfig {
            var: "PINSETTER_JOB_RETENTION",
            reason,
        }),
        Err(_) => Ok(purge::DEFAULT_RETENTION),
    }
}

/// Read/write timeout for one socket request (default 5s)
pub fn ipc_timeout() -> Duration {
    std::env::var("PINSETTER_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Mirror log output to stderr
pub fn log_stderr() -> bool {
    std::env::var("PINSETTER_LOG_STDERR").is_ok_and(|v| !v.is_empty() && v != "0")
}

fn schedule_var(var: &'static str, default: &str) -> Result<Schedule, LifecycleError> {
    let expr = std::env::var(var).unwrap_or_else(|_| default.to_string());
    expr.parse()
        .map_err(|e: pin_engine::ScheduleError| LifecycleError::InvalidConfig { var, reason: e.to_string() })
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
