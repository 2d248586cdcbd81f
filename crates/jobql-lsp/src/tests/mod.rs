//! jobql LSP Tests
//!
//! Organized by category:
//! - test_helpers: Common fixtures (buffer + mock polling client)
//! - test_diagnostics: Backend error text to diagnostic parsing
//! - test_validator: Debounce, dry-run issuing and marker replacement

#[cfg(test)]
mod test_helpers;
