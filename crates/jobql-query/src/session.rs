//! Editor session: validation and job submission for one mounted editor

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jobql_core::{EditorSurface, PollingClient, ResultStore, Result};
use jobql_lsp::{DebouncedValidator, ValidatorConfig};
use jobql_settings::JobqlSettings;
use parking_lot::RwLock;

use crate::button::{ButtonAction, ButtonState};
use crate::controller::{JobController, JobControllerConfig};
use crate::history::JobHistory;

/// Ties a [`DebouncedValidator`] and a [`JobController`] to one editor.
///
/// A session only exists once the editor surface is ready: [`mount`] awaits
/// it, so nothing can validate or submit against an editor that is still
/// loading.
///
/// [`mount`]: QueryEditorSession::mount
pub struct QueryEditorSession {
    query_id: String,
    surface: Arc<dyn EditorSurface>,
    validator: DebouncedValidator,
    controller: JobController,
    unmounted: AtomicBool,
}

impl QueryEditorSession {
    /// Wait for the editor, then validate its starting text right away
    #[tracing::instrument(skip_all, fields(query_id = %query_id))]
    pub async fn mount<F>(
        query_id: String,
        editor_ready: F,
        client: Arc<dyn PollingClient>,
        store: Arc<dyn ResultStore>,
        settings: &JobqlSettings,
    ) -> Result<Self>
    where
        F: Future<Output = Result<Arc<dyn EditorSurface>>>,
    {
        let surface = editor_ready.await.inspect_err(|e| {
            tracing::warn!(error = %e, "editor did not become ready");
        })?;

        let validator = DebouncedValidator::new(
            surface.clone(),
            client.clone(),
            ValidatorConfig::from(settings),
        );
        let controller = JobController::new(
            query_id.clone(),
            surface.clone(),
            client,
            store,
            JobControllerConfig::from(settings),
        );

        validator.validate_now();
        tracing::info!("editor session mounted");

        Ok(Self {
            query_id,
            surface,
            validator,
            controller,
            unmounted: AtomicBool::new(false),
        })
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn surface(&self) -> &Arc<dyn EditorSurface> {
        &self.surface
    }

    pub fn validator(&self) -> &DebouncedValidator {
        &self.validator
    }

    pub fn controller(&self) -> &JobController {
        &self.controller
    }

    pub fn attach_history(&self, history: Arc<RwLock<JobHistory>>) {
        self.controller.attach_history(history);
    }

    /// Forward a text change to the validator
    pub fn on_edit(&self) {
        self.validator.on_edit();
    }

    /// Press the run control
    pub fn submit(&self) -> ButtonAction {
        self.controller.submit()
    }

    pub fn cancel(&self) -> bool {
        self.controller.cancel()
    }

    pub fn button_state(&self) -> ButtonState {
        self.controller.button_state()
    }

    pub fn bytes_processed(&self) -> Option<u64> {
        self.controller.bytes_processed()
    }

    pub fn error_message(&self) -> Option<String> {
        self.controller.error_message()
    }

    /// Stop validation, cancel the job and delete this editor's result entry.
    ///
    /// Runs once; later calls and the drop that follows do nothing.
    pub fn unmount(&self) {
        if self.unmounted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.validator.shutdown();
        self.controller.teardown();
        tracing::info!(query_id = %self.query_id, "editor session unmounted");
    }
}

impl Drop for QueryEditorSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
