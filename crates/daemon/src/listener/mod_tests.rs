// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pin_core::{JobState, JobStatus};
use pin_engine::{CancelJobSweep, Schedule};
use std::time::Duration;
use tokio::net::UnixStream;

fn ctx() -> ListenCtx {
    let curator = JobCurator::in_memory(SystemClock);
    let kernel = LocalKernel::new(curator.clone(), CancellationToken::new());
    let mut runner = Runner::new(CancellationToken::new());
    runner.register(
        Schedule::Every(Duration::from_secs(3600)),
        CancelJobSweep::new(curator.clone(), kernel.clone()),
    );
    ListenCtx { curator, kernel, runner: Arc::new(runner), shutdown: Arc::new(Notify::new()) }
}

fn schedule(id: Option<&str>, command: &str) -> Request {
    Request::JobSchedule {
        id: id.map(str::to_string),
        group: "async".to_string(),
        target: None,
        command: command.to_string(),
    }
}

async fn wait_terminal(ctx: &ListenCtx, id: &str) -> JobStatus {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(job) = ctx.curator.get(id).filter(JobStatus::is_terminal) {
            return job;
        }
        assert!(tokio::time::Instant::now() < deadline, "job {id} never finished");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn scheduled_id(response: Response) -> String {
    match response {
        Response::JobScheduled { id } => id,
        other => panic!("expected JobScheduled, got {other:?}"),
    }
}

#[tokio::test]
async fn ping_returns_pong() {
    assert_eq!(handle_request(Request::Ping, &ctx()).await, Response::Pong);
}

#[tokio::test]
async fn schedule_without_id_generates_one_and_runs_command() {
    let ctx = ctx();

    let id = scheduled_id(handle_request(schedule(None, "echo hello"), &ctx).await);
    assert!(id.starts_with(JobId::PREFIX), "{id}");
    assert_eq!(id.len(), JobId::PREFIX.len() + 19);

    let job = wait_terminal(&ctx, &id).await;
    assert_eq!(job.state, JobState::Finished);
    assert_eq!(job.result.as_deref(), Some("hello"));
}

#[tokio::test]
async fn failing_command_records_exit_code_and_stderr() {
    let ctx = ctx();

    let id = scheduled_id(
        handle_request(schedule(Some("job-broken"), "echo oops >&2; exit 3"), &ctx).await,
    );
    assert_eq!(id, "job-broken");

    let job = wait_terminal(&ctx, &id).await;
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.result.as_deref(), Some("exit 3: oops"));
}

#[tokio::test]
async fn schedule_keeps_target() {
    let ctx = ctx();
    let request = Request::JobSchedule {
        id: Some("job-refresh".to_string()),
        group: "refresh".to_string(),
        target: Some("owner-admin".to_string()),
        command: "true".to_string(),
    };

    scheduled_id(handle_request(request, &ctx).await);

    let job = wait_terminal(&ctx, "job-refresh").await;
    assert_eq!(job.group, "refresh");
    assert_eq!(job.target.as_deref(), Some("owner-admin"));
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let ctx = ctx();

    let response = handle_request(schedule(Some("job-empty"), "  "), &ctx).await;

    assert!(matches!(response, Response::Error { .. }));
    assert!(ctx.curator.get("job-empty").is_none());
}

#[tokio::test]
async fn live_job_cannot_be_scheduled_twice() {
    let ctx = ctx();
    scheduled_id(handle_request(schedule(Some("job-sleep"), "sleep 30"), &ctx).await);

    match handle_request(schedule(Some("job-sleep"), "sleep 30"), &ctx).await {
        Response::Error { message } => assert!(message.contains("already scheduled"), "{message}"),
        other => panic!("expected Error, got {other:?}"),
    }

    ctx.kernel.shutdown().await;
    assert_eq!(ctx.curator.get("job-sleep").unwrap().state, JobState::Canceled);
}

#[tokio::test]
async fn cancel_request_is_carried_out_by_triggered_sweep() {
    let ctx = ctx();
    scheduled_id(handle_request(schedule(Some("job-sleep"), "sleep 30"), &ctx).await);

    let response = handle_request(Request::JobCancel { id: "job-sleep".to_string() }, &ctx).await;
    assert_eq!(response, Response::CancelRequested { requested: true });
    assert!(ctx.curator.get("job-sleep").unwrap().cancel_requested);

    let response =
        handle_request(Request::SweepTrigger { sweep: "cancel-jobs".to_string() }, &ctx).await;
    assert_eq!(
        response,
        Response::SweepRan { outcome: "completed: 1 candidate(s), 1 canceled, 0 failed".to_string() }
    );

    let job = wait_terminal(&ctx, "job-sleep").await;
    assert_eq!(job.state, JobState::Canceled);
}

#[tokio::test]
async fn cancel_of_finished_job_is_not_requested() {
    let ctx = ctx();
    scheduled_id(handle_request(schedule(Some("job-done"), "true"), &ctx).await);
    wait_terminal(&ctx, "job-done").await;

    let response = handle_request(Request::JobCancel { id: "job-done".to_string() }, &ctx).await;

    assert_eq!(response, Response::CancelRequested { requested: false });
}

#[tokio::test]
async fn cancel_of_unknown_job_is_an_error() {
    let response = handle_request(Request::JobCancel { id: "job-missing".to_string() }, &ctx()).await;

    match response {
        Response::Error { message } => assert!(message.contains("job-missing"), "{message}"),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_sweep_is_an_error() {
    let response =
        handle_request(Request::SweepTrigger { sweep: "reindex".to_string() }, &ctx()).await;

    assert_eq!(response, Response::Error { message: "unknown sweep: reindex".to_string() });
}

#[tokio::test]
async fn status_and_queries_reflect_store() {
    let ctx = ctx();
    scheduled_id(handle_request(schedule(Some("job-a"), "true"), &ctx).await);
    wait_terminal(&ctx, "job-a").await;
    scheduled_id(handle_request(schedule(Some("job-b"), "sleep 30"), &ctx).await);

    assert_eq!(
        handle_request(Request::Status, &ctx).await,
        Response::Status { jobs: 2, live_jobs: 1, sweeps: vec!["cancel-jobs".to_string()] }
    );
    match handle_request(Request::JobList, &ctx).await {
        Response::Jobs { jobs } => {
            let ids: Vec<&str> = jobs.iter().map(|job| job.id.as_str()).collect();
            assert_eq!(ids, vec!["job-a", "job-b"]);
        }
        other => panic!("expected Jobs, got {other:?}"),
    }
    assert_eq!(
        handle_request(Request::JobGet { id: "job-missing".to_string() }, &ctx).await,
        Response::Job { job: None }
    );

    ctx.kernel.shutdown().await;
}

#[tokio::test]
async fn shutdown_request_notifies_daemon() {
    let ctx = ctx();

    assert_eq!(handle_request(Request::Shutdown, &ctx).await, Response::ShuttingDown);

    tokio::time::timeout(Duration::from_secs(1), ctx.shutdown.notified())
        .await
        .expect("shutdown was not notified");
}

#[tokio::test]
async fn socket_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("pinsetterd.sock");
    let unix = UnixListener::bind(&socket_path).unwrap();
    let stop = CancellationToken::new();
    let listener = Listener::new(unix, Arc::new(ctx()));
    let task = tokio::spawn(listener.run(stop.clone()));

    let stream = UnixStream::connect(&socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    let body = protocol::encode(&Request::Ping).unwrap();
    protocol::write_message(&mut writer, &body).await.unwrap();
    let reply = protocol::read_message(&mut reader).await.unwrap();
    assert_eq!(protocol::decode::<Response>(&reply).unwrap(), Response::Pong);

    stop.cancel();
    task.await.unwrap();
}
