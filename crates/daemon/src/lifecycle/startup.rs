// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;

use fs2::FileExt;
use pin_core::{JobState, SystemClock};
use pin_engine::{CancelJobSweep, LocalKernel, PurgeJobsSweep, Runner};
use pin_storage::JobCurator;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Config, DaemonState, LifecycleError};
use crate::listener::{ListenCtx, Listener};

/// Result message recorded on jobs that were live when the daemon stopped
pub(crate) const ORPHANED_RESULT: &str = "orphaned by daemon restart";

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // The PID file belongs to the already-running daemon
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Remove a socket left behind by a daemon that did not shut down
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }

    // 4. Recover job state from snapshot + WAL
    let curator = JobCurator::open(&config.snapshot_path, &config.wal_path, SystemClock)?;

    // 5. Jobs live when the last daemon stopped have no task anymore
    let orphans = fail_orphaned_jobs(&curator);
    if orphans > 0 {
        warn!(orphans, "failed jobs orphaned by previous daemon");
    }

    // 6. Kernel, sweeps and listener share one shutdown token
    let shutdown = CancellationToken::new();
    let kernel = LocalKernel::new(curator.clone(), shutdown.child_token());

    let mut runner = Runner::new(shutdown.child_token());
    runner.register(
        config.cancel_schedule.clone(),
        CancelJobSweep::new(curator.clone(), kernel.clone()),
    );
    runner.register(
        config.purge_schedule.clone(),
        PurgeJobsSweep::new(curator.clone(), SystemClock, config.job_retention),
    );
    runner.start();
    let runner = Arc::new(runner);

    // 7. Bind the socket last so clients only connect to a ready daemon
    let unix = match UnixListener::bind(&config.socket_path) {
        Ok(unix) => unix,
        Err(e) => {
            shutdown.cancel();
            return Err(e.into());
        }
    };
    let shutdown_requested = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        curator: curator.clone(),
        kernel: kernel.clone(),
        runner: Arc::clone(&runner),
        shutdown: Arc::clone(&shutdown_requested),
    });
    let listener = tokio::spawn(Listener::new(unix, ctx).run(shutdown.child_token()));

    info!(
        jobs = curator.jobs().len(),
        socket = %config.socket_path.display(),
        cancel_schedule = %config.cancel_schedule,
        purge_schedule = %config.purge_schedule,
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        curator,
        kernel,
        runner,
        shutdown_requested,
        listener: Some(listener),
        shutdown,
    })
}

/// Mark every non-terminal job FAILED. Returns how many were closed.
fn fail_orphaned_jobs(curator: &JobCurator<SystemClock>) -> usize {
    let mut failed = 0;
    for job in curator.jobs().into_iter().filter(|job| !job.is_terminal()) {
        match curator.transition(&job.id, JobState::Failed, Some(ORPHANED_RESULT.to_string())) {
            Ok(_) => failed += 1,
            Err(e) => warn!(job_id = %job.id, error = %e, "failed to close orphaned job"),
        }
    }
    failed
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}
