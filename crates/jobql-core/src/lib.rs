//! jobql Core - Core abstractions shared by the editor and job crates
//!
//! This crate defines the types and collaborator traits the rest of the
//! workspace is written against:
//!
//! - `Diagnostic` - A positioned annotation produced from backend error text
//! - `QueryResult` - A decoded page of job results handed to the result store
//! - `JobRequest`, `JobState`, `JobResponse` - The job submission/update wire model
//! - `PollingClient` / `JobHandle` - Submit-and-poll contract with cooperative cancel
//! - `EditorSurface` / `ResultStore` - The narrow editor and result-store interfaces

mod collaborators;
mod error;
mod job;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
mod types;

pub use collaborators::*;
pub use error::*;
pub use job::*;
pub use types::*;
