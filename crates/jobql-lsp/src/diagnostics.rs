//! Backend error text to positioned diagnostics
//!
//! Dry-run failures come back as plain text. Two formats carry enough
//! information to point at the query:
//!
//! - `Not found: <Kind> <project:dataset.name> ...` - the part after the
//!   project qualifier is looked up in the query text; the last line that
//!   contains it wins.
//! - `Syntax error: <message> at [ROW:COL]` - the row is taken as given and the
//!   marker runs from the column to the next space (or past the end of the line).
//!
//! Anything else yields no diagnostic. Parsing never fails loudly: malformed or
//! out-of-range input simply produces `None`.

use jobql_core::{Diagnostic, DiagnosticKind, DiagnosticSeverity};

pub const NOT_FOUND_PREFIX: &str = "Not found:";
pub const SYNTAX_ERROR_PREFIX: &str = "Syntax error:";

/// Parse backend error text against the query `source` it was produced for
pub fn parse_error(raw: &str, source: &str) -> Option<Diagnostic> {
    if raw.starts_with(NOT_FOUND_PREFIX) {
        parse_not_found(raw, source)
    } else if raw.starts_with(SYNTAX_ERROR_PREFIX) {
        parse_syntax_error(raw, source)
    } else {
        None
    }
}

fn parse_not_found(raw: &str, source: &str) -> Option<Diagnostic> {
    // "Not found: Table project:dataset.table was not found ..."
    let token = raw.split_whitespace().nth(3)?;
    let identifier = unqualified_name(token);
    if identifier.is_empty() {
        return None;
    }

    let (line, column) = find_last_occurrence(source, identifier)
        .map(|(line, column)| (line as i64, column as i64))
        .unwrap_or((-1, -1));
    let width = identifier.chars().count() as i64;

    tracing::trace!(identifier, line, column, "parsed not-found error");

    Some(Diagnostic {
        start_line: line,
        end_line: line,
        start_column: column,
        end_column: column + width,
        message: raw.trim().to_string(),
        severity: DiagnosticSeverity::Error,
        kind: DiagnosticKind::NotFound,
    })
}

fn parse_syntax_error(raw: &str, source: &str) -> Option<Diagnostic> {
    let body = raw.strip_prefix(SYNTAX_ERROR_PREFIX)?;

    let open = body.rfind('[')?;
    let close = open + body[open..].find(']')?;
    let (row, col) = body[open + 1..close].split_once(':')?;
    let line: usize = row.trim().parse().ok()?;
    let column: usize = col.trim().parse().ok()?;

    let at = body[..open].rfind("at")?;
    let message = &body[..at];
    let message = message.strip_prefix(' ').unwrap_or(message);

    let text = source.lines().nth(line.checked_sub(1)?)?;
    let end_column = text
        .chars()
        .enumerate()
        .skip(column)
        .find(|(_, c)| *c == ' ')
        .map(|(index, _)| index)
        .unwrap_or_else(|| text.chars().count() + 1);

    tracing::trace!(line, column, end_column, "parsed syntax error");

    Some(Diagnostic {
        start_line: line as i64,
        end_line: line as i64,
        start_column: column as i64,
        end_column: end_column as i64,
        message: message.to_string(),
        severity: DiagnosticSeverity::Error,
        kind: DiagnosticKind::Syntax,
    })
}

/// Name to look up for a not-found token.
///
/// With a project qualifier (`project:dataset.table`) everything after the
/// last colon is kept, dots included. Without one (`project.dataset.table`)
/// only the segment after the last dot is used.
fn unqualified_name(token: &str) -> &str {
    let token = token.trim_matches(|c: char| matches!(c, '`' | '\'' | '"' | ',' | ';' | '.'));
    match token.rsplit_once(':') {
        Some((_, name)) => name,
        None => token.rsplit('.').next().unwrap_or(token),
    }
}

/// 1-based line and character column of the last line containing `needle`
fn find_last_occurrence(source: &str, needle: &str) -> Option<(usize, usize)> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            line.find(needle)
                .map(|byte| (index + 1, line[..byte].chars().count()))
        })
        .last()
}
