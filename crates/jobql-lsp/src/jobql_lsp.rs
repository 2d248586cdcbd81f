//! jobql LSP - Live diagnostics for the query editor
//!
//! - `diagnostics` turns raw backend error text into a positioned `Diagnostic`
//! - `validator` debounces edits into dry-run validation requests
//! - `buffer` is a rope-backed `EditorSurface` for headless use and tests

mod buffer;
pub mod diagnostics;
mod validator;

#[cfg(test)]
mod tests;

pub use buffer::BufferSurface;
pub use diagnostics::{NOT_FOUND_PREFIX, SYNTAX_ERROR_PREFIX, parse_error};
pub use validator::{DebouncedValidator, ValidatorConfig};
