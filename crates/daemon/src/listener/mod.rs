// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Accepts connections on the daemon socket and answers one request per
//! connection. Job submissions go to the kernel; cancel requests only flag
//! the job so the cancel sweep carries them out.

mod jobs;

use std::sync::Arc;

use pin_core::{JobId, SystemClock};
use pin_engine::{LocalKernel, RunOutcome, Runner};
use pin_storage::JobCurator;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::env::ipc_timeout;
use crate::protocol::{self, Request, Response};

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub curator: JobCurator<SystemClock>,
    pub kernel: LocalKernel<SystemClock>,
    pub runner: Arc<Runner>,
    /// Notified when a client asks the daemon to stop
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, ctx }
    }

    /// Run the listener loop until `stop` fires, spawning a task per connection.
    pub async fn run(self, stop: CancellationToken) {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                result = self.unix.accept() => match result {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            if let Err(e) = handle_connection(reader, writer, &ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("Unix accept error: {}", e),
                },
            }
        }
        debug!("listener stopped");
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// The handler races a disconnect check so a client that gives up does not
/// leave a sweep trigger running on its behalf.
async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let request = protocol::read_request(&mut reader, ipc_timeout()).await?;

    let is_query =
        matches!(request, Request::Ping | Request::Status | Request::JobGet { .. } | Request::JobList);
    if is_query {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = tokio::select! {
        response = handle_request(request, ctx) => response,
        _ = detect_client_disconnect(&mut reader) => {
            debug!("Client disconnected, cancelling handler");
            return Ok(());
        }
    };

    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Resolves once the client closes its end after sending the request.
async fn detect_client_disconnect<R: AsyncReadExt + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Status => {
            let jobs = ctx.curator.jobs();
            Response::Status {
                live_jobs: jobs.iter().filter(|job| !job.is_terminal()).count(),
                jobs: jobs.len(),
                sweeps: ctx.runner.sweep_names().into_iter().map(str::to_string).collect(),
            }
        }

        Request::JobSchedule { id, group, target, command } => {
            jobs::schedule(ctx, id, group, target, command)
        }

        Request::JobCancel { id } => match ctx.curator.request_cancel(&JobId::new(id)) {
            Ok(requested) => Response::CancelRequested { requested },
            Err(e) => Response::Error { message: e.to_string() },
        },

        Request::JobGet { id } => Response::Job { job: ctx.curator.get(&id) },

        Request::JobList => {
            let mut jobs = ctx.curator.jobs();
            jobs.sort_by(|a, b| {
                a.created_at_ms.cmp(&b.created_at_ms).then_with(|| a.id.cmp(&b.id))
            });
            Response::Jobs { jobs }
        }

        Request::SweepTrigger { sweep } => match ctx.runner.trigger(&sweep).await {
            Some(RunOutcome::Completed(report)) => {
                Response::SweepRan { outcome: format!("completed: {report}") }
            }
            Some(RunOutcome::Failed(e)) => Response::SweepRan { outcome: format!("failed: {e}") },
            Some(RunOutcome::Skipped) => {
                Response::SweepRan { outcome: "skipped: already running".to_string() }
            }
            None => Response::Error { message: format!("unknown sweep: {sweep}") },
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
