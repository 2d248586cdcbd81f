//! Remote job backend interface

use async_trait::async_trait;
use jobql_core::{JobRequest, Result, WirePage};
use std::sync::Arc;

/// Receipt for a submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub job_id: String,
    /// The backend finished the job while accepting it (accepted dry runs)
    pub completed: bool,
}

/// One observation of a running job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Still running, nothing new to report
    Running,
    /// A page of results; `last` marks the final page
    Page { page: WirePage, last: bool },
    /// Finished without further pages
    Done,
    /// The job failed. Retryable failures keep the poll cycle alive.
    Failed { message: String, retryable: bool },
}

/// Submits queries and reports paginated status.
///
/// A rejected submission returns `JobqlError::JobRejected` carrying the
/// backend's error text unchanged.
#[async_trait]
pub trait JobBackend: Send + Sync + 'static {
    async fn submit(&self, request: &JobRequest) -> Result<JobTicket>;

    async fn status(&self, ticket: &JobTicket, page: u32) -> Result<JobStatus>;
}

#[async_trait]
impl<T: JobBackend> JobBackend for Arc<T> {
    async fn submit(&self, request: &JobRequest) -> Result<JobTicket> {
        (**self).submit(request).await
    }

    async fn status(&self, ticket: &JobTicket, page: u32) -> Result<JobStatus> {
        (**self).status(ticket, page).await
    }
}
