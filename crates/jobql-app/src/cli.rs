//! Command-line arguments

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Validate a query, run it as a job and print the result
#[derive(Parser, Debug)]
#[command(name = "jobql", version, about)]
pub struct Args {
    /// File holding the query text
    #[arg(required_unless_present = "query", conflicts_with = "query")]
    pub file: Option<PathBuf>,

    /// Query text given inline
    #[arg(short, long)]
    pub query: Option<String>,

    /// Job backend endpoint, overriding the settings file
    #[arg(long, env = "JOBQL_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Only run the dry-run validation
    #[arg(long)]
    pub validate_only: bool,

    /// Submit even when validation reported a diagnostic
    #[arg(long)]
    pub force: bool,

    /// Verbose console logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Query text from the inline argument or the file
    pub fn query_text(&self) -> Result<String> {
        if let Some(query) = &self.query {
            return Ok(query.clone());
        }
        let path = self
            .file
            .as_ref()
            .context("either a query file or --query is required")?;
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query from {:?}", path))
    }
}
