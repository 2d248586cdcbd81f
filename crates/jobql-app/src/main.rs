//! jobql - validate a query, run it as a remote job and print the result

mod cli;
mod logging;
mod runner;

use clap::Parser;

use crate::cli::Args;
use crate::logging::LoggingConfig;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = if args.verbose {
        LoggingConfig::default()
    } else {
        LoggingConfig::production()
    };
    let log_guard = match logging::init(config) {
        Ok(guard) => guard,
        Err(e) => {
            // Logging is not available yet
            eprintln!("FATAL: Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %logging::log_directory().display(),
        "starting jobql"
    );

    let result = runner::run(args).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "run failed");
        eprintln!("error: {e:#}");
    }

    // Flush the file writer before exiting
    drop(log_guard);
    if result.is_err() {
        std::process::exit(1);
    }
}
