//! Debounced dry-run validation
//!
//! Every edit restarts one delay timer and clears the markers right away.
//! When the timer fires, the current text is sent as a dry-run request and a
//! `Fail` response is parsed into at most one diagnostic, which replaces the
//! whole marker set.
//!
//! Each edit bumps a generation counter. Timers, in-flight dry runs and their
//! responses all carry the generation they were started for and are dropped
//! when it no longer matches, so a slow response can never paint markers over
//! text that changed after it was requested.
//!
//! Timers are tokio tasks: `on_edit` and `validate_now` must be called from
//! within a Tokio runtime.

use std::sync::{Arc, Weak};
use std::time::Duration;

use jobql_core::{
    EditorSurface, JobHandle, JobRequest, JobResponse, JobState, PollingClient, UpdateCallback,
};
use jobql_settings::JobqlSettings;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::diagnostics::parse_error;

/// Configuration for the debounced validator
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Quiet period after the last edit before a dry run is issued
    pub delay: Duration,
    /// Poll interval handed to the polling client for dry runs
    pub poll_interval: Duration,
    /// Job configuration sent with every dry run
    pub job_config: serde_json::Value,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1500),
            poll_interval: Duration::from_millis(2000),
            job_config: serde_json::json!({}),
        }
    }
}

impl From<&JobqlSettings> for ValidatorConfig {
    fn from(settings: &JobqlSettings) -> Self {
        Self {
            delay: settings.editor.validation_delay(),
            poll_interval: settings.jobs.poll_interval(),
            job_config: settings.jobs.job_config.clone(),
        }
    }
}

#[derive(Default)]
struct ValidatorState {
    pending_timer: Option<JoinHandle<()>>,
    in_flight: Option<Arc<dyn JobHandle>>,
    generation: u64,
    last_error_cleared: bool,
}

struct Shared {
    surface: Arc<dyn EditorSurface>,
    client: Arc<dyn PollingClient>,
    config: ValidatorConfig,
    state: Mutex<ValidatorState>,
}

/// Turns edits into at most one outstanding dry-run validation
pub struct DebouncedValidator {
    shared: Arc<Shared>,
}

impl DebouncedValidator {
    pub fn new(
        surface: Arc<dyn EditorSurface>,
        client: Arc<dyn PollingClient>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                surface,
                client,
                config,
                state: Mutex::new(ValidatorState {
                    last_error_cleared: true,
                    ..Default::default()
                }),
            }),
        }
    }

    /// Record an edit: restart the delay timer and clear markers immediately
    pub fn on_edit(&self) {
        let (generation, in_flight) = {
            let mut state = self.shared.state.lock();
            let generation = state.bump();
            if let Some(timer) = state.pending_timer.take() {
                timer.abort();
                tracing::trace!(generation, "validation timer restarted");
            }

            let weak = Arc::downgrade(&self.shared);
            let delay = self.shared.config.delay;
            state.pending_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(shared) = weak.upgrade() {
                    shared.fire(generation);
                }
            }));
            state.last_error_cleared = true;
            (generation, state.in_flight.take())
        };

        if let Some(handle) = in_flight {
            tracing::debug!(generation, "cancelling superseded dry run");
            handle.cancel();
        }
        self.shared.surface.clear_diagnostics();
    }

    /// Validate the current text right away, skipping the delay.
    ///
    /// Used when the editor is first mounted.
    pub fn validate_now(&self) {
        let (generation, in_flight) = {
            let mut state = self.shared.state.lock();
            let generation = state.bump();
            if let Some(timer) = state.pending_timer.take() {
                timer.abort();
            }
            (generation, state.in_flight.take())
        };
        if let Some(handle) = in_flight {
            handle.cancel();
        }
        self.shared.validate(generation);
    }

    /// Whether a debounce timer is waiting to fire
    pub fn has_pending_timer(&self) -> bool {
        self.shared
            .state
            .lock()
            .pending_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Whether a dry run is outstanding
    pub fn is_validating(&self) -> bool {
        self.shared
            .state
            .lock()
            .in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Whether the markers were cleared since the last diagnostic was shown
    pub fn last_error_cleared(&self) -> bool {
        self.shared.state.lock().last_error_cleared
    }

    /// Abort the timer and any outstanding dry run
    pub fn shutdown(&self) {
        let in_flight = {
            let mut state = self.shared.state.lock();
            state.bump();
            if let Some(timer) = state.pending_timer.take() {
                timer.abort();
            }
            state.in_flight.take()
        };
        if let Some(handle) = in_flight {
            handle.cancel();
        }
    }
}

impl Drop for DebouncedValidator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ValidatorState {
    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

impl Shared {
    fn fire(self: &Arc<Self>, generation: u64) {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.pending_timer = None;
        }
        tracing::debug!(generation, "validation timer fired");
        self.validate(generation);
    }

    fn validate(self: &Arc<Self>, generation: u64) {
        let text = self.surface.current_text();
        if text.trim().is_empty() {
            tracing::trace!(generation, "empty query, skipping dry run");
            return;
        }

        tracing::debug!(
            generation,
            sql_preview = %text.chars().take(50).collect::<String>(),
            "issuing dry run"
        );

        let request = JobRequest::validation(text.clone(), self.config.job_config.clone());
        let weak: Weak<Self> = Arc::downgrade(self);
        let on_update: UpdateCallback = Arc::new(move |state, _meta, response| {
            if state == JobState::Pending {
                return;
            }
            if let Some(shared) = weak.upgrade() {
                shared.finish(generation, state, &text, &response);
            }
        });

        let handle = self
            .client
            .request(request, on_update, self.config.poll_interval);

        let superseded = {
            let mut state = self.state.lock();
            if state.generation != generation {
                true
            } else {
                if !handle.is_finished() {
                    state.in_flight = Some(handle.clone());
                }
                false
            }
        };
        if superseded {
            handle.cancel();
        }
    }

    fn finish(&self, generation: u64, job_state: JobState, source: &str, response: &JobResponse) {
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::trace!(generation, current = state.generation, "dropping stale dry-run response");
            return;
        }
        state.in_flight = None;

        if job_state != JobState::Fail {
            return;
        }
        let Some(error) = response.error_text() else {
            return;
        };

        match parse_error(error, source) {
            Some(diagnostic) => {
                tracing::debug!(
                    generation,
                    line = diagnostic.start_line,
                    column = diagnostic.start_column,
                    "dry run reported a diagnostic"
                );
                // Markers are replaced under the state lock so a concurrent edit
                // cannot clear them first and have them reappear afterwards.
                self.surface.set_diagnostics(vec![diagnostic]);
                state.last_error_cleared = false;
            }
            None => {
                tracing::debug!(generation, "dry-run error did not map to a position");
            }
        }
    }
}
