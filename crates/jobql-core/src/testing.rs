//! Test doubles for the polling contract
//!
//! `MockPollingClient` records every request and never talks to a backend;
//! tests push updates through it by request index. Delivery honors the cancel
//! contract, so a cancelled handle never reaches its callback.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::{JobHandle, JobMeta, JobRequest, JobResponse, JobState, PollingClient, UpdateCallback};

/// Handle returned by [`MockPollingClient`]
#[derive(Default)]
pub struct MockJobHandle {
    cancelled: AtomicBool,
    finished: AtomicBool,
    cancel_calls: AtomicUsize,
}

impl MockJobHandle {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

impl JobHandle for MockJobHandle {
    fn cancel(&self) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if !self.finished.load(Ordering::SeqCst) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
        self.finished.store(true, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// One request seen by the mock
#[derive(Clone)]
pub struct RecordedRequest {
    pub body: JobRequest,
    pub poll_interval: Duration,
    pub handle: Arc<MockJobHandle>,
    on_update: UpdateCallback,
}

/// Polling client that records requests and lets tests script the updates
#[derive(Default)]
pub struct MockPollingClient {
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockPollingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().iter().map(|r| r.body.clone()).collect()
    }

    pub fn recorded(&self, index: usize) -> RecordedRequest {
        self.requests.lock()[index].clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Deliver an update to request `index`.
    ///
    /// Returns false when the handle was cancelled or already finished, in
    /// which case the callback is not invoked. `Done` and `Fail` end the cycle.
    pub fn deliver(&self, index: usize, state: JobState, response: JobResponse) -> bool {
        let recorded = self.recorded(index);
        if recorded.handle.is_finished() {
            return false;
        }
        if state != JobState::Pending {
            recorded.handle.finished.store(true, Ordering::SeqCst);
        }
        let meta = JobMeta {
            job_id: Some(format!("mock-job-{index}")),
            page: 0,
        };
        (recorded.on_update)(state, meta, response);
        true
    }

    /// Deliver a `Fail` carrying `text` to request `index`
    pub fn fail(&self, index: usize, text: &str) -> bool {
        self.deliver(index, JobState::Fail, JobResponse::Error(text.to_string()))
    }

    /// Deliver `Done` to request `index`
    pub fn done(&self, index: usize) -> bool {
        self.deliver(index, JobState::Done, JobResponse::Empty)
    }
}

impl PollingClient for MockPollingClient {
    fn request(
        &self,
        body: JobRequest,
        on_update: UpdateCallback,
        poll_interval: Duration,
    ) -> Arc<dyn JobHandle> {
        let handle = Arc::new(MockJobHandle::default());
        self.requests.lock().push(RecordedRequest {
            body,
            poll_interval,
            handle: handle.clone(),
            on_update,
        });
        handle
    }
}
