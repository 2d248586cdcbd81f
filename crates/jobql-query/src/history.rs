//! Job history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// How a submitted job ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    Failed(String),
    Cancelled,
}

/// A finished job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobHistoryEntry {
    pub id: Uuid,

    /// Editor the job was submitted from
    pub query_id: String,

    pub query: String,

    /// When the job was submitted
    pub executed_at: DateTime<Utc>,

    pub duration_ms: u64,

    /// Last reported scan size, if any page arrived
    pub bytes_processed: Option<u64>,

    pub outcome: JobOutcome,
}

impl JobHistoryEntry {
    pub fn new(
        query_id: impl Into<String>,
        query: impl Into<String>,
        executed_at: DateTime<Utc>,
        duration_ms: u64,
        bytes_processed: Option<u64>,
        outcome: JobOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            query_id: query_id.into(),
            query: query.into(),
            executed_at,
            duration_ms,
            bytes_processed,
            outcome,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == JobOutcome::Succeeded
    }
}

/// Bounded job history, most recent first
pub struct JobHistory {
    entries: VecDeque<JobHistoryEntry>,
    max_entries: usize,
}

impl JobHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Add an entry, evicting the oldest past capacity
    pub fn add(&mut self, entry: JobHistoryEntry) {
        tracing::debug!(
            entry_id = %entry.id,
            query_id = %entry.query_id,
            outcome = ?entry.outcome,
            duration_ms = entry.duration_ms,
            "recording job in history"
        );
        self.entries.push_front(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_back();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &JobHistoryEntry> {
        self.entries.iter()
    }

    /// Entries submitted from one editor
    pub fn for_query(&self, query_id: &str) -> impl Iterator<Item = &JobHistoryEntry> {
        self.entries.iter().filter(move |e| e.query_id == query_id)
    }

    /// Case-insensitive search over the query text
    pub fn search(&self, needle: &str) -> impl Iterator<Item = &JobHistoryEntry> {
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .filter(move |e| e.query.to_lowercase().contains(&needle))
    }

    pub fn clear(&mut self) {
        tracing::info!(entries_cleared = self.entries.len(), "clearing job history");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for JobHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(query_id: &str, query: &str, outcome: JobOutcome) -> JobHistoryEntry {
        JobHistoryEntry::new(query_id, query, Utc::now(), 10, None, outcome)
    }

    #[test]
    fn test_most_recent_first_and_bounded() {
        let mut history = JobHistory::new(2);
        history.add(entry("a", "SELECT 1", JobOutcome::Succeeded));
        history.add(entry("a", "SELECT 2", JobOutcome::Cancelled));
        history.add(entry("b", "SELECT 3", JobOutcome::Failed("boom".into())));

        let queries: Vec<_> = history.entries().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["SELECT 3", "SELECT 2"]);
    }

    #[test]
    fn test_search_and_filter() {
        let mut history = JobHistory::default();
        history.add(entry("a", "SELECT * FROM Orders", JobOutcome::Succeeded));
        history.add(entry("b", "SELECT * FROM users", JobOutcome::Succeeded));

        assert_eq!(history.search("orders").count(), 1);
        assert_eq!(history.for_query("b").count(), 1);
        assert!(history.entries().all(|e| e.succeeded()));

        history.clear();
        assert!(history.is_empty());
    }
}
