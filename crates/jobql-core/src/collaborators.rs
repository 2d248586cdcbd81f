//! Interfaces of the editor widget and the application result store

use crate::{Diagnostic, QueryResult};

/// The narrow slice of the text editor the core talks to
pub trait EditorSurface: Send + Sync {
    /// Full current text of the editor
    fn current_text(&self) -> String;

    /// Text of the 1-based line `n`, without its line terminator
    fn line(&self, n: usize) -> Option<String>;

    /// Replace every displayed marker with `diagnostics`
    fn set_diagnostics(&self, diagnostics: Vec<Diagnostic>);

    /// Remove every displayed marker
    fn clear_diagnostics(&self);
}

/// Application-wide storage of results, keyed by editor identity
pub trait ResultStore: Send + Sync {
    /// Store (or overwrite) the result for `query_id`
    fn push_result(&self, query_id: &str, result: QueryResult);

    /// Drop the stored result but keep the slot
    fn clear_result(&self, query_id: &str);

    /// Remove the slot for `query_id` entirely
    fn delete_entry(&self, query_id: &str);
}
