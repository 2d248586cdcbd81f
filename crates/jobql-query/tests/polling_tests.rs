//! Integration tests for PollingJobClient
//!
//! Runs the real poll loop against a scripted backend on paused tokio time.

mod common;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use jobql_core::{JobHandle, JobMeta, JobRequest, JobResponse, JobState, JobqlError, PollingClient, UpdateCallback};
use jobql_query::{JobStatus, PollingJobClient};

use common::{POLL_INTERVAL, ScriptedBackend, wire_page};

type Updates = Arc<Mutex<Vec<(JobState, JobMeta, JobResponse)>>>;

fn recorder() -> (Updates, UpdateCallback) {
    let updates: Updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    let callback: UpdateCallback = Arc::new(move |state, meta, response| {
        sink.lock().push((state, meta, response));
    });
    (updates, callback)
}

fn start(backend: ScriptedBackend) -> (Arc<ScriptedBackend>, Updates, Arc<dyn JobHandle>) {
    let backend = Arc::new(backend);
    let client = PollingJobClient::with_shared_backend(backend.clone());
    let (updates, callback) = recorder();
    let handle = client.request(
        JobRequest::submission("SELECT 1", json!({})),
        callback,
        POLL_INTERVAL,
    );
    (backend, updates, handle)
}

fn states(updates: &Updates) -> Vec<JobState> {
    updates.lock().iter().map(|(state, _, _)| *state).collect()
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn pages_are_delivered_then_done() {
    let first = wire_page(json!([[1]]), &["n"], 10);
    let second = wire_page(json!([[2]]), &["n"], 20);
    let backend = ScriptedBackend::new()
        .with_status(JobStatus::Page {
            page: first.clone(),
            last: false,
        })
        .with_status(JobStatus::Running)
        .with_status(JobStatus::Page {
            page: second.clone(),
            last: true,
        });

    let (backend, updates, handle) = start(backend);
    advance(7000).await;

    assert_eq!(
        states(&updates),
        vec![JobState::Pending, JobState::Pending, JobState::Done]
    );
    let updates = updates.lock();
    assert_eq!(updates[0].2, JobResponse::Page(first));
    assert_eq!(updates[0].1.page, 0);
    assert_eq!(updates[0].1.job_id.as_deref(), Some("job-1"));
    assert_eq!(updates[1].2, JobResponse::Page(second));
    assert_eq!(updates[1].1.page, 1);
    assert_eq!(
        backend.calls(),
        vec!["submit", "status:0", "status:1", "status:1"]
    );
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn polls_at_the_requested_interval() {
    let (backend, _updates, handle) = start(ScriptedBackend::new());

    advance(1900).await;
    assert_eq!(backend.calls(), vec!["submit"]);

    advance(200).await;
    assert_eq!(backend.status_calls(), 1);

    advance(2000).await;
    assert_eq!(backend.status_calls(), 2);

    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn retryable_failure_keeps_polling() {
    let backend = ScriptedBackend::new()
        .with_status(JobStatus::Failed {
            message: "Rate limited".into(),
            retryable: true,
        })
        .with_status(JobStatus::Done);

    let (backend, updates, handle) = start(backend);
    advance(4100).await;

    assert_eq!(states(&updates), vec![JobState::Fail, JobState::Done]);
    assert_eq!(updates.lock()[0].2.error_text(), Some("Rate limited"));
    assert_eq!(backend.status_calls(), 2);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn terminal_failure_stops_polling() {
    let backend = ScriptedBackend::new()
        .with_status(JobStatus::Failed {
            message: "Syntax error: Unexpected identifier at [1:8]".into(),
            retryable: false,
        })
        .with_status(JobStatus::Done);

    let (backend, updates, handle) = start(backend);
    advance(10_000).await;

    assert_eq!(states(&updates), vec![JobState::Fail]);
    assert_eq!(backend.status_calls(), 1);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn status_error_is_a_terminal_fail() {
    let backend = ScriptedBackend::new()
        .with_status_error(JobqlError::Transport("connection reset".into()));

    let (_backend, updates, _handle) = start(backend);
    advance(2100).await;

    assert_eq!(states(&updates), vec![JobState::Fail]);
    assert_eq!(
        updates.lock()[0].2.error_text(),
        Some("Transport error: connection reset")
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_fails_with_raw_text() {
    let raw = "Not found: Table project:dataset.orders was not found in location US";
    let (backend, updates, handle) = start(ScriptedBackend::rejecting(raw));
    advance(10).await;

    assert_eq!(states(&updates), vec![JobState::Fail]);
    assert_eq!(updates.lock()[0].2.error_text(), Some(raw));
    assert_eq!(backend.calls(), vec!["submit"]);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn completed_ticket_is_done_without_polling() {
    let (backend, updates, handle) = start(ScriptedBackend::completing());
    advance(5000).await;

    assert_eq!(states(&updates), vec![JobState::Done]);
    assert_eq!(backend.status_calls(), 0);

    handle.cancel();
    handle.cancel();
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_polling_and_suppresses_updates() {
    let backend = ScriptedBackend::new()
        .with_status(JobStatus::Running)
        .with_status(JobStatus::Page {
            page: wire_page(json!([[1]]), &["n"], 1),
            last: true,
        });

    let (backend, updates, handle) = start(backend);
    advance(2100).await;
    assert_eq!(backend.status_calls(), 1);

    handle.cancel();
    assert!(handle.is_finished());
    advance(10_000).await;

    assert_eq!(backend.status_calls(), 1);
    assert!(updates.lock().is_empty());
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn cancel_before_submission_completes_sends_nothing() {
    let (_backend, updates, handle) = start(ScriptedBackend::rejecting("boom"));
    handle.cancel();

    advance(100).await;

    assert!(updates.lock().is_empty());
}
