//! In-memory result store
//!
//! Each editor owns one slot keyed by its query id. Clearing empties the slot
//! but keeps it; deleting removes the slot when the editor goes away.

use std::collections::HashMap;

use jobql_core::{QueryResult, ResultStore};
use parking_lot::RwLock;

#[derive(Default)]
pub struct SharedResultStore {
    slots: RwLock<HashMap<String, Option<QueryResult>>>,
}

impl SharedResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest result stored for `query_id`
    pub fn get(&self, query_id: &str) -> Option<QueryResult> {
        self.slots.read().get(query_id).cloned().flatten()
    }

    /// Whether `query_id` owns a slot, empty or not
    pub fn has_entry(&self, query_id: &str) -> bool {
        self.slots.read().contains_key(query_id)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl ResultStore for SharedResultStore {
    fn push_result(&self, query_id: &str, result: QueryResult) {
        tracing::trace!(query_id, rows = result.row_count(), "storing result");
        self.slots.write().insert(query_id.to_string(), Some(result));
    }

    fn clear_result(&self, query_id: &str) {
        self.slots.write().insert(query_id.to_string(), None);
    }

    fn delete_entry(&self, query_id: &str) {
        self.slots.write().remove(query_id);
    }
}
