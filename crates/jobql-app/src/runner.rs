//! Runs one query through an editor session against the HTTP backend

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use jobql_core::{Diagnostic, EditorSurface, PollingClient, QueryResult};
use jobql_lsp::BufferSurface;
use jobql_query::{
    ButtonState, HttpJobBackend, JobHistory, PollingJobClient, QueryEditorSession,
    SharedResultStore,
};
use jobql_settings::JobqlSettings;
use parking_lot::RwLock;

use crate::cli::Args;

const QUERY_ID: &str = "jobql-cli";
const TICK: Duration = Duration::from_millis(100);

pub async fn run(args: Args) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => JobqlSettings::load_from(path)?,
        None => JobqlSettings::load()?,
    };
    if let Some(endpoint) = &args.endpoint {
        settings.jobs.endpoint = endpoint.clone();
    }
    let query = args.query_text()?;

    tracing::info!(endpoint = %settings.jobs.endpoint, "using job backend");

    let client: Arc<dyn PollingClient> = Arc::new(PollingJobClient::new(HttpJobBackend::new(
        settings.jobs.endpoint.clone(),
    )));
    let store = Arc::new(SharedResultStore::new());
    let buffer = Arc::new(BufferSurface::new(&query));
    let surface: Arc<dyn EditorSurface> = buffer.clone();

    let session = QueryEditorSession::mount(
        QUERY_ID.to_string(),
        async move { Ok(surface) },
        client,
        store.clone(),
        &settings,
    )
    .await
    .context("Failed to mount editor session")?;
    let history = Arc::new(RwLock::new(JobHistory::default()));
    session.attach_history(history.clone());

    while session.validator().is_validating() {
        tokio::time::sleep(TICK).await;
    }

    let diagnostics = buffer.diagnostics();
    for diagnostic in &diagnostics {
        print_diagnostic(&buffer, diagnostic);
    }
    if args.validate_only {
        session.unmount();
        if diagnostics.is_empty() {
            println!("Query is valid");
            return Ok(());
        }
        bail!("validation reported {} diagnostic(s)", diagnostics.len());
    }
    if !diagnostics.is_empty() && !args.force {
        session.unmount();
        bail!("not submitting: validation reported a diagnostic (use --force to submit anyway)");
    }

    session.submit();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, cancelling job");
                session.cancel();
                break;
            }
            _ = tokio::time::sleep(TICK) => {
                if session.button_state() != ButtonState::Pending {
                    break;
                }
            }
        }
    }

    let outcome = match session.error_message() {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => {
            if let Some(result) = store.get(QUERY_ID) {
                print_result(&result);
            }
            Ok(())
        }
    };

    if let Some(entry) = history.read().entries().next() {
        tracing::info!(
            outcome = ?entry.outcome,
            duration_ms = entry.duration_ms,
            bytes_processed = ?entry.bytes_processed,
            "job finished"
        );
    }

    session.unmount();
    outcome
}

fn print_diagnostic(buffer: &BufferSurface, diagnostic: &Diagnostic) {
    if !diagnostic.is_positioned() {
        eprintln!("{:?}: {}", diagnostic.severity, diagnostic.message);
        return;
    }
    eprintln!(
        "{:?} at {}:{}: {}",
        diagnostic.severity, diagnostic.start_line, diagnostic.start_column, diagnostic.message
    );
    let line = usize::try_from(diagnostic.start_line)
        .ok()
        .and_then(|n| buffer.line(n));
    if let Some(line) = line {
        let start = usize::try_from(diagnostic.start_column).unwrap_or(0);
        let width = usize::try_from(diagnostic.end_column - diagnostic.start_column)
            .unwrap_or(1)
            .max(1);
        eprintln!("  {line}");
        eprintln!("  {}{}", " ".repeat(start), "^".repeat(width));
    }
}

fn print_result(result: &QueryResult) {
    let mut table = Table::new();
    table.set_header(result.labels.clone());
    for row in &result.content {
        table.add_row(row.iter().map(cell_text));
    }
    println!("{table}");
    println!(
        "{} row(s), {} bytes processed",
        result.row_count(),
        result.bytes_processed
    );
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!(null)), "NULL");
        assert_eq!(cell_text(&json!("alice")), "alice");
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&json!(true)), "true");
    }
}
