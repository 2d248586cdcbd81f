//! Job submission and polling contract

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Body of a job request as sent to the backend.
///
/// A validation request (`dry_run_only == true`) only checks the query; a
/// submission request executes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub query: String,
    pub job_config: serde_json::Value,
    pub dry_run_only: bool,
}

impl JobRequest {
    /// Build a dry-run validation request
    pub fn validation(query: impl Into<String>, job_config: serde_json::Value) -> Self {
        Self {
            query: query.into(),
            job_config,
            dry_run_only: true,
        }
    }

    /// Build a real submission request
    pub fn submission(query: impl Into<String>, job_config: serde_json::Value) -> Self {
        Self {
            query: query.into(),
            job_config,
            dry_run_only: false,
        }
    }
}

/// Poll state reported with every update.
///
/// `Pending` means an intermediate page (or nothing yet) arrived for a job that
/// is still running; it says nothing about the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Fail,
    Done,
}

/// Metadata delivered alongside each update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobMeta {
    /// Backend job id, once the backend assigned one
    pub job_id: Option<String>,
    /// Zero-based index of the page carried by this update
    pub page: u32,
}

/// A result page as it travels on the wire.
///
/// Every field is itself a JSON document encoded as a string and must be
/// decoded before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePage {
    pub content: String,
    pub labels: String,
    pub bytes_processed: String,
}

/// Payload of one update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResponse {
    /// A page of results
    Page(WirePage),
    /// Error text from the backend
    Error(String),
    /// No payload
    Empty,
}

impl JobResponse {
    /// The error text, if this update carries one
    pub fn error_text(&self) -> Option<&str> {
        match self {
            JobResponse::Error(text) => Some(text),
            _ => None,
        }
    }
}

/// Callback invoked for each observed state change or page
pub type UpdateCallback = Arc<dyn Fn(JobState, JobMeta, JobResponse) + Send + Sync>;

/// Token for one outstanding request/poll cycle.
///
/// `cancel` stops future polling and suppresses further updates. It is safe to
/// call repeatedly and after the job finished on its own.
pub trait JobHandle: Send + Sync {
    fn cancel(&self);

    /// Whether the cycle ended, either naturally or by cancellation
    fn is_finished(&self) -> bool;
}

/// Submits a job and polls it until completion or cancellation
pub trait PollingClient: Send + Sync {
    fn request(
        &self,
        body: JobRequest,
        on_update: UpdateCallback,
        poll_interval: Duration,
    ) -> Arc<dyn JobHandle>;
}
