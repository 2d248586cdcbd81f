//! Rope-backed editor surface
//!
//! Stands in for the editor widget when there is no UI: it owns the text and
//! records whatever markers the validator sets.

use jobql_core::{Diagnostic, EditorSurface};
use parking_lot::RwLock;
use ropey::Rope;

#[derive(Default)]
pub struct BufferSurface {
    text: RwLock<Rope>,
    diagnostics: RwLock<Vec<Diagnostic>>,
}

impl BufferSurface {
    pub fn new(text: &str) -> Self {
        Self {
            text: RwLock::new(Rope::from_str(text)),
            diagnostics: RwLock::new(Vec::new()),
        }
    }

    /// Replace the whole text
    pub fn set_text(&self, text: &str) {
        *self.text.write() = Rope::from_str(text);
    }

    /// Insert `text` at character offset `char_idx` (clamped to the end)
    pub fn insert(&self, char_idx: usize, text: &str) {
        let mut rope = self.text.write();
        let at = char_idx.min(rope.len_chars());
        rope.insert(at, text);
    }

    /// Markers currently displayed
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.read().clone()
    }

    pub fn line_count(&self) -> usize {
        self.text.read().len_lines()
    }
}

impl EditorSurface for BufferSurface {
    fn current_text(&self) -> String {
        self.text.read().to_string()
    }

    fn line(&self, n: usize) -> Option<String> {
        let rope = self.text.read();
        let index = n.checked_sub(1)?;
        if index >= rope.len_lines() {
            return None;
        }
        let line = rope.line(index).to_string();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn set_diagnostics(&self, diagnostics: Vec<Diagnostic>) {
        *self.diagnostics.write() = diagnostics;
    }

    fn clear_diagnostics(&self) {
        self.diagnostics.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_one_based_without_terminator() {
        let buffer = BufferSurface::new("SELECT *\r\nFROM t\n");
        assert_eq!(buffer.line(1).as_deref(), Some("SELECT *"));
        assert_eq!(buffer.line(2).as_deref(), Some("FROM t"));
        assert_eq!(buffer.line(0), None);
        assert_eq!(buffer.line(4), None);
    }

    #[test]
    fn test_insert_clamps_to_end() {
        let buffer = BufferSurface::new("SELECT");
        buffer.insert(100, " 1");
        assert_eq!(buffer.current_text(), "SELECT 1");
    }
}
