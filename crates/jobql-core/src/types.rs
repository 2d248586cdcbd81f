//! Core types for jobql

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    #[default]
    Error,
    Warning,
    Info,
    Hint,
}

/// Which backend error format a diagnostic was recovered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `Not found: ...` reference errors
    NotFound,
    /// `Syntax error: ... at [ROW:COL]` errors
    Syntax,
}

/// A positioned annotation attached to the query text.
///
/// Lines are 1-based, matching the row the backend reports. Columns are
/// character offsets into the line. A reference that could not be located in
/// the text is reported with `start_line == -1` and `start_column == -1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub start_line: i64,
    pub end_line: i64,
    pub start_column: i64,
    pub end_column: i64,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Whether the diagnostic points at a real location in the text
    pub fn is_positioned(&self) -> bool {
        self.start_line >= 1 && self.start_column >= 0
    }
}

/// A decoded page of results for one editor's query.
///
/// Ownership moves to the result store when pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Identity of the editor the result belongs to
    pub query_id: String,
    /// Result rows
    pub content: Vec<Vec<serde_json::Value>>,
    /// Column names
    pub labels: Vec<String>,
    /// Bytes scanned by the backend so far
    pub bytes_processed: u64,
}

impl QueryResult {
    /// Create an empty result for the given query identity
    pub fn empty(query_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            content: Vec::new(),
            labels: Vec::new(),
            bytes_processed: 0,
        }
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.content.len()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocated_diagnostic_is_not_positioned() {
        let diagnostic = Diagnostic {
            start_line: -1,
            end_line: -1,
            start_column: -1,
            end_column: 4,
            message: "Not found: Table a:b.c".into(),
            severity: DiagnosticSeverity::Error,
            kind: DiagnosticKind::NotFound,
        };
        assert!(!diagnostic.is_positioned());
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&DiagnosticSeverity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
