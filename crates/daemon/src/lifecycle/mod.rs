// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pin_core::SystemClock;
use pin_engine::{cancel, purge, LocalKernel, Runner, Schedule, ScheduleError};
use pin_storage::{JobCurator, StoreError};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/pinsetter)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Unix socket accepting client requests
    pub socket_path: PathBuf,
    /// Path to WAL file
    pub wal_path: PathBuf,
    /// Path to snapshot file
    pub snapshot_path: PathBuf,
    /// Directory for daemon log files
    pub logs_path: PathBuf,
    pub cancel_schedule: Schedule,
    pub purge_schedule: Schedule,
    /// How long terminal jobs are kept before purging
    pub job_retention: Duration,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Uses fixed paths under `~/.local/state/pinsetter/` (or
    /// `$XDG_STATE_HOME/pinsetter/`, or `$PINSETTER_STATE_DIR`).
    pub fn load() -> Result<Self, LifecycleError> {
        let mut config = Self::for_state_dir(&crate::env::state_dir()?)?;
        config.cancel_schedule = crate::env::cancel_job_schedule()?;
        config.purge_schedule = crate::env::purge_schedule()?;
        config.job_retention = crate::env::job_retention()?;
        Ok(config)
    }

    /// Default configuration rooted at `state_dir`.
    pub fn for_state_dir(state_dir: &Path) -> Result<Self, LifecycleError> {
        Ok(Self {
            lock_path: state_dir.join("pinsetterd.pid"),
            socket_path: state_dir.join("pinsetterd.sock"),
            wal_path: state_dir.join("wal").join("jobs.wal"),
            snapshot_path: state_dir.join("snapshot.zst"),
            logs_path: state_dir.join("logs"),
            cancel_schedule: cancel::DEFAULT_SCHEDULE.parse()?,
            purge_schedule: purge::DEFAULT_SCHEDULE.parse()?,
            job_retention: purge::DEFAULT_RETENTION,
            state_dir: state_dir.to_path_buf(),
        })
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub curator: JobCurator<SystemClock>,
    pub kernel: LocalKernel<SystemClock>,
    pub runner: Arc<Runner>,
    /// Notified when a client sends a shutdown request
    pub shutdown_requested: Arc<Notify>,
    listener: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl DaemonState {
    /// Shutdown the daemon gracefully.
    ///
    /// Stops the listener and sweep loops, cancels live jobs and waits for
    /// each to record CANCELED, then writes a final snapshot so the next
    /// startup does not need to replay the WAL.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        self.shutdown.cancel();
        if let Some(listener) = self.listener.take() {
            if let Err(e) = listener.await {
                warn!(error = %e, "listener ended abnormally");
            }
        }
        self.runner.shutdown().await;
        self.kernel.shutdown().await;

        match self.curator.checkpoint(&self.config.snapshot_path) {
            Ok(seq) => info!(seq, "saved final shutdown snapshot"),
            Err(e) => warn!(error = %e, "failed to save shutdown snapshot"),
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove PID file");
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("invalid {var}: {reason}")]
    InvalidConfig { var: &'static str, reason: String },

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
