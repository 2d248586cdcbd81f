//! jobql Query - Job submission, polling and result hand-off
//!
//! This crate owns the lifecycle of a submitted query: the toggle button state
//! machine, the polling client that talks to the job backend, decoding of
//! result pages, job history, and the editor session that ties validation and
//! submission together.

mod backend;
pub mod button;
mod controller;
mod history;
mod http_backend;
mod polling;
mod result_store;
mod session;
pub mod wire;

pub use backend::{JobBackend, JobStatus, JobTicket};
pub use button::{ButtonAction, ButtonState, ButtonTrigger, Transition};
pub use controller::{JobController, JobControllerConfig};
pub use history::{JobHistory, JobHistoryEntry, JobOutcome};
pub use http_backend::HttpJobBackend;
pub use polling::PollingJobClient;
pub use result_store::SharedResultStore;
pub use session::QueryEditorSession;
