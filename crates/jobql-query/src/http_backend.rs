//! JSON-over-HTTP job backend
//!
//! - `POST {endpoint}/jobs` with a [`JobRequest`] body answers
//!   `{"jobId": "...", "completed": false}`; any non-success status is a
//!   rejection whose body text is the backend error message.
//! - `GET {endpoint}/jobs/{jobId}?page=N` answers
//!   `{"state": "running" | "page" | "done" | "failed", ...}` with the page
//!   fields (`content`, `labels`, `bytesProcessed`, `last`) or the failure
//!   fields (`error`, `retryable`).

use async_trait::async_trait;
use jobql_core::{JobRequest, JobqlError, Result, WirePage};
use serde::Deserialize;

use crate::backend::{JobBackend, JobStatus, JobTicket};

pub struct HttpJobBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpJobBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody {
    job_id: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusKind {
    Running,
    Page,
    Done,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    state: StatusKind,
    content: Option<String>,
    labels: Option<String>,
    bytes_processed: Option<String>,
    #[serde(default)]
    last: bool,
    error: Option<String>,
    #[serde(default)]
    retryable: bool,
}

impl StatusBody {
    fn into_status(self) -> Result<JobStatus> {
        Ok(match self.state {
            StatusKind::Running => JobStatus::Running,
            StatusKind::Done => JobStatus::Done,
            StatusKind::Failed => JobStatus::Failed {
                message: self.error.unwrap_or_else(|| "job failed".to_string()),
                retryable: self.retryable,
            },
            StatusKind::Page => {
                let (Some(content), Some(labels), Some(bytes_processed)) =
                    (self.content, self.labels, self.bytes_processed)
                else {
                    return Err(JobqlError::Decode(
                        "page status is missing content, labels or bytesProcessed".to_string(),
                    ));
                };
                JobStatus::Page {
                    page: WirePage {
                        content,
                        labels,
                        bytes_processed,
                    },
                    last: self.last,
                }
            }
        })
    }
}

fn transport(e: reqwest::Error) -> JobqlError {
    JobqlError::Transport(e.to_string())
}

#[async_trait]
impl JobBackend for HttpJobBackend {
    #[tracing::instrument(skip(self, request), fields(dry_run = request.dry_run_only))]
    async fn submit(&self, request: &JobRequest) -> Result<JobTicket> {
        let response = self
            .client
            .post(format!("{}/jobs", self.endpoint))
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let text = response.text().await.map_err(transport)?;
            return Err(JobqlError::JobRejected(text));
        }

        let body: SubmitBody = response
            .json()
            .await
            .map_err(|e| JobqlError::Decode(e.to_string()))?;
        Ok(JobTicket {
            job_id: body.job_id,
            completed: body.completed,
        })
    }

    #[tracing::instrument(skip(self, ticket), fields(job_id = %ticket.job_id))]
    async fn status(&self, ticket: &JobTicket, page: u32) -> Result<JobStatus> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.endpoint, ticket.job_id))
            .query(&[("page", page)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(transport)?;
            return Err(JobqlError::Transport(format!("HTTP {status}: {text}")));
        }

        let body: StatusBody = response
            .json()
            .await
            .map_err(|e| JobqlError::Decode(e.to_string()))?;
        body.into_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(json: &str) -> Result<JobStatus> {
        serde_json::from_str::<StatusBody>(json).unwrap().into_status()
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let backend = HttpJobBackend::new("http://localhost:8080/");
        assert_eq!(backend.endpoint(), "http://localhost:8080");
    }

    #[test]
    fn test_page_status() {
        let parsed = status(
            r#"{"state":"page","content":"[[1]]","labels":"[\"n\"]","bytesProcessed":"\"42\"","last":true}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            JobStatus::Page {
                page: WirePage {
                    content: "[[1]]".into(),
                    labels: "[\"n\"]".into(),
                    bytes_processed: "\"42\"".into(),
                },
                last: true,
            }
        );
    }

    #[test]
    fn test_failed_status_keeps_message() {
        let parsed = status(r#"{"state":"failed","error":"Resources exceeded","retryable":true}"#).unwrap();
        assert_eq!(
            parsed,
            JobStatus::Failed {
                message: "Resources exceeded".into(),
                retryable: true
            }
        );
    }

    #[test]
    fn test_incomplete_page_is_decode_error() {
        let err = status(r#"{"state":"page","content":"[]"}"#).unwrap_err();
        assert!(matches!(err, JobqlError::Decode(_)));
    }

    #[test]
    fn test_running_and_done() {
        assert_eq!(status(r#"{"state":"running"}"#).unwrap(), JobStatus::Running);
        assert_eq!(status(r#"{"state":"done"}"#).unwrap(), JobStatus::Done);
    }
}
