//! Polling client over a [`JobBackend`]
//!
//! Each request runs as one tokio task: submit, then fetch status every
//! `poll_interval` until the job ends or the handle is cancelled. Every await
//! races the cancellation token, and the token is checked again right before
//! each delivery, so nothing reaches the callback once `cancel` returned on
//! the same thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jobql_core::{
    JobHandle, JobMeta, JobRequest, JobResponse, JobState, PollingClient, UpdateCallback,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::backend::{JobBackend, JobStatus};

#[derive(Default)]
struct PollHandle {
    token: CancellationToken,
    finished: AtomicBool,
}

impl JobHandle for PollHandle {
    fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("cancelling poll cycle");
        }
        self.token.cancel();
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst) || self.token.is_cancelled()
    }
}

/// [`PollingClient`] that drives a [`JobBackend`] from tokio tasks
pub struct PollingJobClient<B: JobBackend> {
    backend: Arc<B>,
}

impl<B: JobBackend> PollingJobClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Share an existing backend instance
    pub fn with_shared_backend(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

impl<B: JobBackend> PollingClient for PollingJobClient<B> {
    fn request(
        &self,
        body: JobRequest,
        on_update: UpdateCallback,
        poll_interval: Duration,
    ) -> Arc<dyn JobHandle> {
        let handle = Arc::new(PollHandle::default());
        let backend = self.backend.clone();
        let task_handle = handle.clone();
        let span = tracing::debug_span!("poll_job", dry_run = body.dry_run_only);

        tokio::spawn(
            async move {
                run_poll_cycle(backend.as_ref(), &body, &on_update, poll_interval, &task_handle)
                    .await;
                task_handle.finished.store(true, Ordering::SeqCst);
            }
            .instrument(span),
        );

        handle
    }
}

async fn run_poll_cycle<B: JobBackend>(
    backend: &B,
    body: &JobRequest,
    on_update: &UpdateCallback,
    poll_interval: Duration,
    handle: &PollHandle,
) {
    let token = &handle.token;

    let submitted = tokio::select! {
        _ = token.cancelled() => return,
        result = backend.submit(body) => result,
    };
    let ticket = match submitted {
        Ok(ticket) => ticket,
        Err(e) => {
            tracing::debug!(error = %e, "submission rejected");
            deliver(handle, on_update, JobState::Fail, JobMeta::default(), JobResponse::Error(e.to_string()));
            return;
        }
    };

    let mut meta = JobMeta {
        job_id: Some(ticket.job_id.clone()),
        page: 0,
    };
    tracing::debug!(job_id = %ticket.job_id, completed = ticket.completed, "job accepted");

    if ticket.completed {
        deliver(handle, on_update, JobState::Done, meta, JobResponse::Empty);
        return;
    }

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(poll_interval) => {}
        }

        let status = tokio::select! {
            _ = token.cancelled() => return,
            status = backend.status(&ticket, meta.page) => status,
        };

        match status {
            Ok(JobStatus::Running) => {
                tracing::trace!(page = meta.page, "job still running");
            }
            Ok(JobStatus::Page { page, last }) => {
                tracing::debug!(page = meta.page, last, "result page received");
                deliver(handle, on_update, JobState::Pending, meta.clone(), JobResponse::Page(page));
                meta.page += 1;
                if last {
                    deliver(handle, on_update, JobState::Done, meta, JobResponse::Empty);
                    return;
                }
            }
            Ok(JobStatus::Done) => {
                deliver(handle, on_update, JobState::Done, meta, JobResponse::Empty);
                return;
            }
            Ok(JobStatus::Failed { message, retryable }) => {
                tracing::debug!(retryable, "job reported failure");
                deliver(handle, on_update, JobState::Fail, meta.clone(), JobResponse::Error(message));
                if !retryable {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "status request failed");
                deliver(handle, on_update, JobState::Fail, meta, JobResponse::Error(e.to_string()));
                return;
            }
        }
    }
}

fn deliver(
    handle: &PollHandle,
    on_update: &UpdateCallback,
    state: JobState,
    meta: JobMeta,
    response: JobResponse,
) {
    if handle.token.is_cancelled() {
        tracing::trace!(?state, "suppressing update for cancelled job");
        return;
    }
    on_update(state, meta, response);
}
