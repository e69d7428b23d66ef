// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::startup::ORPHANED_RESULT;
use super::*;
use fs2::FileExt;
use pin_core::{JobId, JobState, JobStatus};
use crate::protocol::{self, Request, Response};
use pin_engine::{RunOutcome, SweepReport};
use tempfile::tempdir;
use tokio::net::UnixStream;

fn pending() -> impl std::future::Future<Output = Result<String, String>> {
    std::future::pending()
}

#[test]
fn config_layout() {
    let config = Config::for_state_dir(Path::new("/var/lib/pin")).unwrap();

    assert_eq!(config.lock_path, PathBuf::from("/var/lib/pin/pinsetterd.pid"));
    assert_eq!(config.socket_path, PathBuf::from("/var/lib/pin/pinsetterd.sock"));
    assert_eq!(config.wal_path, PathBuf::from("/var/lib/pin/wal/jobs.wal"));
    assert_eq!(config.snapshot_path, PathBuf::from("/var/lib/pin/snapshot.zst"));
    assert_eq!(config.logs_path, PathBuf::from("/var/lib/pin/logs"));
    assert_eq!(config.job_retention, Duration::from_secs(24 * 3600));
}

#[tokio::test]
async fn startup_writes_pid_and_shutdown_removes_it() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();

    let mut daemon = startup(&config).await.unwrap();
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert!(config.wal_path.exists());
    assert!(config.socket_path.exists());

    daemon.shutdown().await.unwrap();
    assert!(!config.lock_path.exists());
    assert!(!config.socket_path.exists());
    assert!(config.snapshot_path.exists());
}

#[tokio::test]
async fn startup_lock_failed_does_not_remove_pid_file() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();

    // Simulate a running daemon holding the lock
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(&config).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert_eq!(std::fs::read_to_string(&config.lock_path).unwrap(), "12345");
}

#[tokio::test]
async fn restart_recovers_finished_jobs() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    {
        let mut daemon = startup(&config).await.unwrap();
        let job = JobStatus::new("job-import", "async", daemon.curator.clock());
        let handle =
            daemon.kernel.spawn_singleton(job, async { Ok("3 pools".to_string()) }).unwrap();
        assert_eq!(handle.await.unwrap(), JobState::Finished);
        daemon.shutdown().await.unwrap();
    }

    let mut daemon = startup(&config).await.unwrap();
    let job = daemon.curator.get("job-import").unwrap();
    assert_eq!(job.state, JobState::Finished);
    assert_eq!(job.result.as_deref(), Some("3 pools"));
    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn jobs_live_at_crash_are_failed_on_restart() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    {
        let daemon = startup(&config).await.unwrap();
        let job = JobStatus::new("job-refresh", "async", daemon.curator.clock());
        daemon.kernel.spawn_singleton(job, pending()).unwrap();
        tokio::task::yield_now().await;
        // Dropped without shutdown: no snapshot, lock released
    }

    let mut daemon = startup(&config).await.unwrap();
    let job = daemon.curator.get("job-refresh").unwrap();
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.result.as_deref(), Some(ORPHANED_RESULT));
    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn cancel_request_is_carried_out_by_sweep() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    let mut daemon = startup(&config).await.unwrap();

    let job = JobStatus::new("job-refresh", "async", daemon.curator.clock());
    let handle = daemon.kernel.spawn_singleton(job, pending()).unwrap();
    assert!(daemon.curator.request_cancel(&JobId::new("job-refresh")).unwrap());

    let outcome = daemon.runner.trigger("cancel-jobs").await.unwrap();
    match outcome {
        RunOutcome::Completed(SweepReport::Canceled(report)) => {
            assert_eq!(report.canceled, vec![JobId::new("job-refresh")]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(handle.await.unwrap(), JobState::Canceled);

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn jobs_live_at_graceful_shutdown_are_canceled() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    {
        let mut daemon = startup(&config).await.unwrap();
        let job = JobStatus::new("job-refresh", "async", daemon.curator.clock());
        let handle = daemon.kernel.spawn_singleton(job, pending()).unwrap();
        tokio::task::yield_now().await;

        daemon.shutdown().await.unwrap();
        // Recorded before shutdown returns, not after
        assert_eq!(daemon.curator.get("job-refresh").unwrap().state, JobState::Canceled);
        assert_eq!(handle.await.unwrap(), JobState::Canceled);
    }

    let mut daemon = startup(&config).await.unwrap();
    let job = daemon.curator.get("job-refresh").unwrap();
    assert_eq!(job.state, JobState::Canceled);
    assert_eq!(job.result, None);
    daemon.shutdown().await.unwrap();
}

async fn send(config: &Config, request: &Request) -> Response {
    let stream = UnixStream::connect(&config.socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_message(&mut writer, &protocol::encode(request).unwrap()).await.unwrap();
    protocol::decode(&protocol::read_message(&mut reader).await.unwrap()).unwrap()
}

#[tokio::test]
async fn client_schedules_and_cancels_over_socket() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    let mut daemon = startup(&config).await.unwrap();

    let request = Request::JobSchedule {
        id: Some("job-sleep".to_string()),
        group: "async".to_string(),
        target: None,
        command: "sleep 30".to_string(),
    };
    assert_eq!(
        send(&config, &request).await,
        Response::JobScheduled { id: "job-sleep".to_string() }
    );
    assert_eq!(
        send(&config, &Request::JobCancel { id: "job-sleep".to_string() }).await,
        Response::CancelRequested { requested: true }
    );
    match send(&config, &Request::SweepTrigger { sweep: "cancel-jobs".to_string() }).await {
        Response::SweepRan { outcome } => assert!(outcome.contains("1 canceled"), "{outcome}"),
        other => panic!("expected SweepRan, got {other:?}"),
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !daemon.curator.get("job-sleep").unwrap().is_terminal() {
        assert!(tokio::time::Instant::now() < deadline, "job never canceled");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(daemon.curator.get("job-sleep").unwrap().state, JobState::Canceled);

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn client_shutdown_request_wakes_daemon() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    let mut daemon = startup(&config).await.unwrap();

    assert_eq!(send(&config, &Request::Shutdown).await, Response::ShuttingDown);
    tokio::time::timeout(Duration::from_secs(1), daemon.shutdown_requested.notified())
        .await
        .expect("shutdown was not requested");

    daemon.shutdown().await.unwrap();
    assert!(!config.socket_path.exists());
}
