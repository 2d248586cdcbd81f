//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use jobql_core::testing::MockPollingClient;
use jobql_core::{JobRequest, JobResponse, JobqlError, Result, WirePage};
use jobql_lsp::BufferSurface;
use jobql_query::{JobBackend, JobController, JobControllerConfig, JobStatus, JobTicket, SharedResultStore};

pub const QUERY_ID: &str = "editor-1";
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const RESET_DELAY: Duration = Duration::from_millis(2000);

pub struct ControllerFixture {
    pub buffer: Arc<BufferSurface>,
    pub client: Arc<MockPollingClient>,
    pub store: Arc<SharedResultStore>,
    pub controller: JobController,
}

/// Controller for `QUERY_ID` over a buffer holding `text`
pub fn controller_fixture(text: &str) -> ControllerFixture {
    let buffer = Arc::new(BufferSurface::new(text));
    let client = MockPollingClient::new();
    let store = Arc::new(SharedResultStore::new());
    let controller = JobController::new(
        QUERY_ID,
        buffer.clone(),
        client.clone(),
        store.clone(),
        JobControllerConfig::default(),
    );
    ControllerFixture {
        buffer,
        client,
        store,
        controller,
    }
}

/// Wire page with each field JSON-encoded as a string
pub fn wire_page(content: serde_json::Value, labels: &[&str], bytes_processed: u64) -> WirePage {
    WirePage {
        content: content.to_string(),
        labels: serde_json::json!(labels).to_string(),
        bytes_processed: serde_json::json!(bytes_processed.to_string()).to_string(),
    }
}

pub fn page(content: serde_json::Value, labels: &[&str], bytes_processed: u64) -> JobResponse {
    JobResponse::Page(wire_page(content, labels, bytes_processed))
}

/// Backend that answers from a script.
///
/// Statuses are handed out in order; once the script runs out every poll
/// reports `Running`. Every call is logged as `submit` or `status:<page>`.
#[derive(Default)]
pub struct ScriptedBackend {
    pub reject_with: Option<String>,
    pub completed: bool,
    pub statuses: Mutex<VecDeque<Result<JobStatus>>>,
    pub call_log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(text: impl Into<String>) -> Self {
        Self {
            reject_with: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn completing() -> Self {
        Self {
            completed: true,
            ..Self::default()
        }
    }

    pub fn with_status(self, status: JobStatus) -> Self {
        self.statuses.lock().push_back(Ok(status));
        self
    }

    pub fn with_status_error(self, error: JobqlError) -> Self {
        self.statuses.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.call_log
            .lock()
            .iter()
            .filter(|call| call.starts_with("status"))
            .count()
    }
}

#[async_trait]
impl JobBackend for ScriptedBackend {
    async fn submit(&self, _request: &JobRequest) -> Result<JobTicket> {
        self.call_log.lock().push("submit".to_string());
        if let Some(text) = &self.reject_with {
            return Err(JobqlError::JobRejected(text.clone()));
        }
        Ok(JobTicket {
            job_id: "job-1".to_string(),
            completed: self.completed,
        })
    }

    async fn status(&self, _ticket: &JobTicket, page: u32) -> Result<JobStatus> {
        self.call_log.lock().push(format!("status:{page}"));
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or(Ok(JobStatus::Running))
    }
}
