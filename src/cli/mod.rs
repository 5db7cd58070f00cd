//! Command-line parsing.
//!
//! Every option has a default, so a bare `rates` reproduces the classic
//! 90-day report. Each flag can also be set through the environment (or a
//! `.env` file, loaded before parsing).

use chrono::NaiveDate;
use clap::Parser;

use crate::domain::{DEFAULT_BASE_URL, DEFAULT_PERIOD, ErrorPolicy};

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "rates",
    version,
    about = "Min/max/average CBR exchange rates over a lookback window"
)]
pub struct Cli {
    /// Lookback window length in days.
    #[arg(long, env = "CBR_PERIOD", default_value_t = DEFAULT_PERIOD)]
    pub period: u32,

    /// Last day of the window (YYYY-MM-DD). Defaults to today.
    #[arg(long, env = "CBR_END_DATE", value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Daily rates endpoint; `?date_req=DD/MM/YYYY` is appended.
    #[arg(long, env = "CBR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "CBR_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Pause before each request, in milliseconds.
    #[arg(long, env = "CBR_DELAY_MS", default_value_t = 50)]
    pub delay_ms: u64,

    /// Attempts per date for transient failures (1 disables retries).
    #[arg(long, env = "CBR_RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// Backoff before the first retry, in milliseconds; doubles per retry.
    #[arg(long, env = "CBR_BACKOFF_MS", default_value_t = 500)]
    pub backoff_ms: u64,

    /// Number of dates fetched concurrently.
    #[arg(short = 'j', long, env = "CBR_JOBS", default_value_t = 4)]
    pub jobs: usize,

    /// What to do when a date cannot be fetched or decoded.
    #[arg(long, env = "CBR_ON_ERROR", value_enum, default_value_t = ErrorPolicy::Skip)]
    pub on_error: ErrorPolicy,
}
