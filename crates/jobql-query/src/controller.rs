//! Lifecycle of the submitted job for one editor
//!
//! The controller owns at most one in-flight job. Every submit and every
//! cancel bumps an epoch; update callbacks and the error auto-reset timer
//! capture the epoch they were created for and do nothing once it moved on.
//! That is what keeps a late page, a late `Done`, or a reset timer armed by
//! an earlier failure from touching the state of a newer job.
//!
//! Result-store writes for a job happen under the same lock that guards the
//! epoch, so a page that passed the epoch check cannot land after the next
//! submit cleared the slot.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use jobql_core::{
    EditorSurface, JobHandle, JobMeta, JobRequest, JobResponse, JobState, PollingClient,
    ResultStore, UpdateCallback,
};
use jobql_settings::JobqlSettings;
use parking_lot::{Mutex, RwLock};

use crate::button::{ButtonAction, ButtonState, ButtonTrigger, transition};
use crate::history::{JobHistory, JobHistoryEntry, JobOutcome};
use crate::wire::decode_page;

/// Configuration for job submission
#[derive(Debug, Clone)]
pub struct JobControllerConfig {
    /// Poll interval handed to the polling client
    pub poll_interval: Duration,
    /// How long the button stays in `Error` before returning to `Ready`
    pub error_reset_delay: Duration,
    /// Job configuration sent with every submission
    pub job_config: serde_json::Value,
}

impl Default for JobControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            error_reset_delay: Duration::from_millis(2000),
            job_config: serde_json::json!({}),
        }
    }
}

impl From<&JobqlSettings> for JobControllerConfig {
    fn from(settings: &JobqlSettings) -> Self {
        Self {
            poll_interval: settings.jobs.poll_interval(),
            error_reset_delay: settings.jobs.error_reset_delay(),
            job_config: settings.jobs.job_config.clone(),
        }
    }
}

struct RunningJob {
    query: String,
    submitted_at: DateTime<Utc>,
    started: Instant,
}

struct JobInner {
    button: ButtonState,
    epoch: u64,
    handle: Option<Arc<dyn JobHandle>>,
    bytes_processed: Option<u64>,
    error_message: Option<String>,
    running: Option<RunningJob>,
    history: Option<Arc<RwLock<JobHistory>>>,
}

struct Shared {
    query_id: String,
    surface: Arc<dyn EditorSurface>,
    client: Arc<dyn PollingClient>,
    store: Arc<dyn ResultStore>,
    config: JobControllerConfig,
    inner: Mutex<JobInner>,
}

/// Submits, polls and cancels the query of one editor
pub struct JobController {
    shared: Arc<Shared>,
}

impl JobController {
    pub fn new(
        query_id: impl Into<String>,
        surface: Arc<dyn EditorSurface>,
        client: Arc<dyn PollingClient>,
        store: Arc<dyn ResultStore>,
        config: JobControllerConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                query_id: query_id.into(),
                surface,
                client,
                store,
                config,
                inner: Mutex::new(JobInner {
                    button: ButtonState::Ready,
                    epoch: 0,
                    handle: None,
                    bytes_processed: None,
                    error_message: None,
                    running: None,
                    history: None,
                }),
            }),
        }
    }

    /// Record finished, failed and cancelled jobs into `history`
    pub fn attach_history(&self, history: Arc<RwLock<JobHistory>>) {
        self.shared.inner.lock().history = Some(history);
    }

    pub fn query_id(&self) -> &str {
        &self.shared.query_id
    }

    pub fn button_state(&self) -> ButtonState {
        self.shared.inner.lock().button
    }

    /// Bytes processed as reported by the latest page of the current job
    pub fn bytes_processed(&self) -> Option<u64> {
        self.shared.inner.lock().bytes_processed
    }

    /// Error of the last failed job
    pub fn error_message(&self) -> Option<String> {
        self.shared.inner.lock().error_message.clone()
    }

    /// Incremented on every submit and cancel
    pub fn epoch(&self) -> u64 {
        self.shared.inner.lock().epoch
    }

    /// Whether a job handle is held
    pub fn is_running(&self) -> bool {
        self.shared.inner.lock().handle.is_some()
    }

    /// Press the run control.
    ///
    /// Submits the current text from `Ready` or `Error`; while a job is
    /// pending the same press cancels it instead.
    #[tracing::instrument(skip(self), fields(query_id = %self.shared.query_id))]
    pub fn submit(&self) -> ButtonAction {
        let state = self.button_state();
        match transition(state, ButtonTrigger::Press).map(|t| t.action) {
            Some(ButtonAction::Submit) => {
                self.shared.start();
                ButtonAction::Submit
            }
            Some(ButtonAction::Cancel) => {
                self.cancel();
                ButtonAction::Cancel
            }
            _ => ButtonAction::None,
        }
    }

    /// Cancel the outstanding job.
    ///
    /// Returns false, changing nothing, when no job is outstanding.
    #[tracing::instrument(skip(self), fields(query_id = %self.shared.query_id))]
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Cancel outstanding work and remove this editor's result slot
    pub fn teardown(&self) {
        self.shared.cancel();
        self.shared.store.delete_entry(&self.shared.query_id);
        tracing::debug!(query_id = %self.shared.query_id, "result entry deleted");
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

impl Shared {
    fn start(self: &Arc<Self>) {
        let query = self.surface.current_text();

        let epoch = {
            let mut inner = self.inner.lock();
            let Some(t) = transition(inner.button, ButtonTrigger::Press)
                .filter(|t| t.action == ButtonAction::Submit)
            else {
                return;
            };
            inner.epoch += 1;
            inner.button = t.next;
            inner.bytes_processed = None;
            inner.error_message = None;
            inner.running = Some(RunningJob {
                query: query.clone(),
                submitted_at: Utc::now(),
                started: Instant::now(),
            });
            self.store.clear_result(&self.query_id);
            inner.epoch
        };

        tracing::info!(
            epoch,
            sql_preview = %query.chars().take(50).collect::<String>(),
            "submitting job"
        );

        let weak: Weak<Self> = Arc::downgrade(self);
        let on_update: UpdateCallback = Arc::new(move |state, meta, response| {
            if let Some(shared) = weak.upgrade() {
                shared.on_update(epoch, state, meta, response);
            }
        });

        let request = JobRequest::submission(query, self.config.job_config.clone());
        let handle = self
            .client
            .request(request, on_update, self.config.poll_interval);

        let stale = {
            let mut inner = self.inner.lock();
            if inner.epoch == epoch && inner.button == ButtonState::Pending {
                inner.handle = Some(handle.clone());
                false
            } else {
                true
            }
        };
        if stale {
            handle.cancel();
        }
    }

    fn cancel(&self) -> bool {
        let handle = {
            let mut inner = self.inner.lock();
            let Some(handle) = inner.handle.take() else {
                return false;
            };
            inner.epoch += 1;
            if let Some(t) = transition(inner.button, ButtonTrigger::Press) {
                inner.button = t.next;
            }
            self.record(&mut inner, JobOutcome::Cancelled);
            handle
        };

        handle.cancel();
        tracing::info!(query_id = %self.query_id, "job cancelled");
        true
    }

    fn on_update(self: &Arc<Self>, epoch: u64, state: JobState, meta: JobMeta, response: JobResponse) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || inner.button != ButtonState::Pending {
            tracing::trace!(epoch, current = inner.epoch, ?state, "ignoring stale job update");
            return;
        }

        match state {
            JobState::Pending => {
                let JobResponse::Page(page) = response else {
                    return;
                };
                match decode_page(&page, &self.query_id) {
                    Ok(result) => {
                        tracing::debug!(
                            page = meta.page,
                            rows = result.row_count(),
                            bytes_processed = result.bytes_processed,
                            "result page decoded"
                        );
                        inner.bytes_processed = Some(result.bytes_processed);
                        self.store.push_result(&self.query_id, result);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, page = meta.page, "discarding undecodable page");
                        let handle = self.fail(&mut inner, epoch, e.to_string());
                        drop(inner);
                        if let Some(handle) = handle {
                            handle.cancel();
                        }
                    }
                }
            }
            JobState::Fail => {
                let message = response
                    .error_text()
                    .map(str::to_string)
                    .unwrap_or_else(|| "job failed".to_string());
                let handle = self.fail(&mut inner, epoch, message);
                drop(inner);
                if let Some(handle) = handle {
                    handle.cancel();
                }
            }
            JobState::Done => {
                if let Some(t) = transition(inner.button, ButtonTrigger::JobDone) {
                    inner.button = t.next;
                }
                inner.handle = None;
                self.record(&mut inner, JobOutcome::Succeeded);
                tracing::info!(
                    job_id = ?meta.job_id,
                    bytes_processed = ?inner.bytes_processed,
                    "job completed"
                );
            }
        }
    }

    /// Move to `Error`, arm the auto-reset, and hand back the handle to cancel
    fn fail(
        self: &Arc<Self>,
        inner: &mut JobInner,
        epoch: u64,
        message: String,
    ) -> Option<Arc<dyn JobHandle>> {
        let t = transition(inner.button, ButtonTrigger::JobFailed)?;
        inner.button = t.next;
        tracing::warn!(epoch, error = %message, "job failed");
        inner.error_message = Some(message.clone());
        self.record(inner, JobOutcome::Failed(message));

        if t.action == ButtonAction::ArmReset {
            let weak = Arc::downgrade(self);
            let delay = self.config.error_reset_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(shared) = weak.upgrade() {
                    shared.reset_after_error(epoch);
                }
            });
        }

        inner.handle.take()
    }

    fn reset_after_error(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            tracing::trace!(epoch, current = inner.epoch, "stale error reset ignored");
            return;
        }
        if let Some(t) = transition(inner.button, ButtonTrigger::ResetElapsed) {
            inner.button = t.next;
            tracing::debug!(epoch, "error state reset");
        }
    }

    fn record(&self, inner: &mut JobInner, outcome: JobOutcome) {
        let Some(job) = inner.running.take() else {
            return;
        };
        let Some(history) = inner.history.as_ref() else {
            return;
        };
        history.write().add(JobHistoryEntry::new(
            self.query_id.clone(),
            job.query,
            job.submitted_at,
            job.started.elapsed().as_millis() as u64,
            inner.bytes_processed,
            outcome,
        ));
    }
}
