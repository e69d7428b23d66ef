// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell command jobs submitted over the socket.

use std::future::Future;

use pin_core::{JobId, JobStatus};
use tokio::process::Command;
use tracing::debug;

use super::ListenCtx;
use crate::protocol::Response;

pub(super) fn schedule(
    ctx: &ListenCtx,
    id: Option<String>,
    group: String,
    target: Option<String>,
    command: String,
) -> Response {
    if command.trim().is_empty() {
        return Response::Error { message: "command is empty".to_string() };
    }

    let id = match id {
        Some(id) if !id.is_empty() => JobId::new(id),
        _ => JobId::generate(),
    };
    let mut job = JobStatus::new(id.clone(), group, ctx.curator.clock());
    if let Some(target) = target {
        job = job.with_target(target);
    }

    // The kernel tracks the task; the handle is not needed here
    match ctx.kernel.spawn_singleton(job, shell_work(command)) {
        Ok(_) => Response::JobScheduled { id: id.to_string() },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

/// Run `command` under bash. Dropping the future kills the child.
///
/// Success yields trimmed stdout; failure yields the exit code and stderr.
pub(super) fn shell_work(
    command: String,
) -> impl Future<Output = Result<String, String>> + Send + 'static {
    async move {
        let output = Command::new("bash")
            .arg("-c")
            .arg(&command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to spawn: {e}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(command = %command, status = %output.status, "shell job exited");

        if output.status.success() {
            Ok(stdout)
        } else {
            Err(format!("exit {}: {}", output.status.code().unwrap_or(-1), stderr))
        }
    }
}
