//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging and maps errors to exit codes; this
//! module parses arguments, runs the pipeline and prints the table.

use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::cli::Cli;
use crate::domain::{ReportConfig, RetryPolicy};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `rates` binary.
pub fn run() -> Result<(), AppError> {
    // Optional: lets CBR_* overrides live in a .env file.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let today = chrono::Local::now().date_naive();
    let config = report_config_from_args(&cli, today)?;
    log::debug!("{config:?}");

    let run = pipeline::run_report(&config)?;
    let rows = crate::report::build_rows(&run.aggregate, config.period);
    print!("{}", crate::report::render_table(&rows, &run.window));

    if !run.skipped.is_empty() {
        log::warn!(
            "{} of {} days were skipped; averages still divide by {}",
            run.skipped.len(),
            config.period,
            config.period
        );
    }

    Ok(())
}

/// Validate CLI values and resolve them into a `ReportConfig`.
pub fn report_config_from_args(cli: &Cli, today: NaiveDate) -> Result<ReportConfig, AppError> {
    if cli.period == 0 {
        return Err(AppError::config("--period must be at least 1."));
    }
    if cli.retries == 0 {
        return Err(AppError::config("--retries must be at least 1."));
    }
    if cli.jobs == 0 {
        return Err(AppError::config("--jobs must be at least 1."));
    }
    if cli.timeout_secs == 0 {
        return Err(AppError::config("--timeout-secs must be at least 1."));
    }
    let base_url = cli.base_url.trim();
    if base_url.is_empty() {
        return Err(AppError::config("--base-url must not be empty."));
    }

    Ok(ReportConfig {
        period: cli.period,
        end_date: cli.end_date.unwrap_or(today),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(cli.timeout_secs),
        request_delay: Duration::from_millis(cli.delay_ms),
        retry: RetryPolicy {
            max_attempts: cli.retries,
            initial_backoff: Duration::from_millis(cli.backoff_ms),
        },
        jobs: cli.jobs,
        on_error: cli.on_error,
    })
}
