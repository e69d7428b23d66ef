// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pin_core::FakeClock;
use tokio::sync::oneshot;

fn kernel() -> LocalKernel<FakeClock> {
    LocalKernel::new(JobCurator::in_memory(FakeClock::new()), CancellationToken::new())
}

fn job(kernel: &LocalKernel<FakeClock>, id: &str) -> JobStatus {
    JobStatus::new(id, "async", kernel.curator().clock())
}

#[tokio::test]
async fn completed_job_is_finished() {
    let kernel = kernel();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = kernel
        .spawn_singleton(job(&kernel, "job-1"), async move {
            let _ = rx.await;
            Ok("imported 3 pools".to_string())
        })
        .unwrap();

    let keys = kernel.list_singleton_job_keys().await.unwrap();
    assert!(keys.contains(&JobKey::new("job-1", "async")));

    tx.send(()).unwrap();
    assert_eq!(handle.await.unwrap(), JobState::Finished);

    let status = kernel.curator().get("job-1").unwrap();
    assert_eq!(status.state, JobState::Finished);
    assert_eq!(status.result.as_deref(), Some("imported 3 pools"));
    assert!(kernel.list_singleton_job_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_work_is_recorded() {
    let kernel = kernel();
    let handle = kernel
        .spawn_singleton(job(&kernel, "job-1"), async { Err("upstream timeout".to_string()) })
        .unwrap();

    assert_eq!(handle.await.unwrap(), JobState::Failed);
    let status = kernel.curator().get("job-1").unwrap();
    assert_eq!(status.result.as_deref(), Some("upstream timeout"));
}

#[tokio::test]
async fn cancel_stops_job_and_unregisters_key() {
    let kernel = kernel();
    let handle = kernel
        .spawn_singleton(job(&kernel, "job-1"), std::future::pending::<Result<String, String>>())
        .unwrap();

    kernel.cancel(&JobId::new("job-1"), "async").await.unwrap();

    assert!(kernel.list_singleton_job_keys().await.unwrap().is_empty());
    assert_eq!(handle.await.unwrap(), JobState::Canceled);
    assert_eq!(kernel.curator().get("job-1").unwrap().state, JobState::Canceled);
}

#[tokio::test]
async fn duplicate_live_key_is_rejected() {
    let kernel = kernel();
    kernel
        .spawn_singleton(job(&kernel, "job-1"), std::future::pending::<Result<String, String>>())
        .unwrap();

    let err = kernel
        .spawn_singleton(job(&kernel, "job-1"), async { Ok(String::new()) })
        .unwrap_err();

    assert_eq!(
        err,
        SchedulerError::OperationFailed {
            job: JobKey::new("job-1", "async"),
            reason: "already scheduled".to_string(),
        }
    );
}

#[tokio::test]
async fn key_can_be_reused_after_completion() {
    let kernel = kernel();
    let first = kernel.spawn_singleton(job(&kernel, "job-1"), async { Ok(String::new()) }).unwrap();
    assert_eq!(first.await.unwrap(), JobState::Finished);

    let second = kernel
        .spawn_singleton(job(&kernel, "job-1"), std::future::pending::<Result<String, String>>())
        .unwrap();
    assert_eq!(kernel.list_singleton_job_keys().await.unwrap().len(), 1);

    kernel.cancel(&JobId::new("job-1"), "async").await.unwrap();
    assert_eq!(second.await.unwrap(), JobState::Canceled);
}

#[tokio::test]
async fn failed_persist_releases_reserved_key() {
    let kernel = kernel();
    // Live in the store but not registered with the kernel
    kernel.curator().create(job(&kernel, "job-1")).unwrap();

    let err = kernel
        .spawn_singleton(job(&kernel, "job-1"), async { Ok(String::new()) })
        .unwrap_err();

    assert!(matches!(err, SchedulerError::OperationFailed { ref reason, .. } if reason.contains("already exists")));
    assert!(kernel.list_singleton_job_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_unknown_job_fails() {
    let kernel = kernel();
    kernel
        .spawn_singleton(job(&kernel, "job-1"), std::future::pending::<Result<String, String>>())
        .unwrap();

    // Unknown name, then a known name under the wrong group
    for (name, group) in [("job-2", "async"), ("job-1", "other")] {
        let err = kernel.cancel(&JobId::new(name), group).await.unwrap_err();
        assert!(matches!(err, SchedulerError::OperationFailed { .. }), "{name}/{group}");
    }
    assert_eq!(kernel.list_singleton_job_keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn shutdown_cancels_live_jobs_and_refuses_work() {
    let kernel = kernel();
    let handle = kernel
        .spawn_singleton(job(&kernel, "job-1"), std::future::pending::<Result<String, String>>())
        .unwrap();

    kernel.shutdown().await;

    // Final state is recorded before shutdown returns
    assert_eq!(kernel.curator().get("job-1").unwrap().state, JobState::Canceled);
    assert_eq!(handle.await.unwrap(), JobState::Canceled);
    assert!(matches!(
        kernel.list_singleton_job_keys().await,
        Err(SchedulerError::Unavailable(_))
    ));
    assert!(matches!(
        kernel.cancel(&JobId::new("job-1"), "async").await,
        Err(SchedulerError::Unavailable(_))
    ));
    assert!(matches!(
        kernel.spawn_singleton(job(&kernel, "job-2"), async { Ok(String::new()) }),
        Err(SchedulerError::Unavailable(_))
    ));
}

#[tokio::test]
async fn fake_kernel_records_cancels() {
    let kernel = FakeKernel::new();
    kernel.register("job-a", "g1");
    kernel.fail_cancel("job-b");

    kernel.cancel(&JobId::new("job-a"), "g1").await.unwrap();
    assert!(kernel.cancel(&JobId::new("job-b"), "g1").await.is_err());

    assert_eq!(kernel.cancel_calls(), vec![JobKey::new("job-a", "g1"), JobKey::new("job-b", "g1")]);
    assert!(kernel.list_singleton_job_keys().await.unwrap().is_empty());
    assert_eq!(kernel.list_calls(), 1);
}
