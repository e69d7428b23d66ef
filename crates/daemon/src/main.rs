// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pinsetterd: runs the job supervisor until SIGINT/SIGTERM or a client
//! shutdown request.

use pin_daemon::{env, logging, startup, Config, LifecycleError};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    let _log_guard = logging::init(&config.logs_path, env::log_stderr())?;

    let mut daemon = match startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            return Err(e);
        }
    };

    let shutdown_requested = std::sync::Arc::clone(&daemon.shutdown_requested);
    tokio::select! {
        result = wait_for_signal() => {
            result?;
            info!("shutdown signal received");
        }
        _ = shutdown_requested.notified() => info!("shutdown requested by client"),
    }
    daemon.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<(), LifecycleError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<(), LifecycleError> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
