//! Shared domain types.
//!
//! Decoded documents (`DailyRates`), the per-currency running statistic
//! (`CurrencyStat`), and the resolved run configuration (`ReportConfig`).

use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;

/// Default CBR endpoint for the English daily rates document.
pub const DEFAULT_BASE_URL: &str = "https://www.cbr.ru/scripts/XML_daily_eng.asp";
/// Default lookback window length (days).
pub const DEFAULT_PERIOD: u32 = 90;

/// One currency quote from a daily document.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRateEntry {
    /// Alphabetic code, e.g. `USD`.
    pub code: String,
    /// Rates are quoted per `nominal` units.
    pub nominal: u32,
    /// Quoted value for `nominal` units.
    pub value: f64,
    /// Date the source says the quote was published for.
    pub date: NaiveDate,
}

impl DailyRateEntry {
    /// Per-unit rate (`value / nominal`).
    pub fn normalized(&self) -> f64 {
        self.value / f64::from(self.nominal)
    }
}

/// A decoded daily document.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRates {
    /// Publication date from the document root. This can lag the requested
    /// date on weekends and holidays.
    pub date: NaiveDate,
    pub entries: Vec<DailyRateEntry>,
}

/// A min or max observation together with the date it was first seen on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extreme {
    pub value: f64,
    pub date: NaiveDate,
}

/// Running statistics for one currency across the window.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyStat {
    pub min: Extreme,
    pub max: Extreme,
    /// Sum of every normalized value folded in.
    pub sum: f64,
    /// Number of values folded in.
    pub observations: usize,
}

impl CurrencyStat {
    pub fn new(value: f64, date: NaiveDate) -> Self {
        let first = Extreme { value, date };
        Self {
            min: first,
            max: first,
            sum: value,
            observations: 1,
        }
    }

    /// Window average: `sum / period`, not `sum / observations`.
    pub fn average(&self, period: u32) -> f64 {
        self.sum / f64::from(period)
    }
}

/// What to do with a date whose document could not be fetched or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicy {
    /// Log a warning and continue without that date.
    Skip,
    /// Stop the run on the first failed date.
    Abort,
}

/// Retry schedule for transient fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per date, including the first one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles after each further failure.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Wait before attempt `attempt` (1-based, so attempt 2 is the first retry).
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(2).min(16);
        self.initial_backoff.saturating_mul(1 << exp)
    }
}

/// Fully resolved configuration for a single run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub period: u32,
    pub end_date: NaiveDate,
    pub base_url: String,
    pub timeout: Duration,
    pub request_delay: Duration,
    pub retry: RetryPolicy,
    pub jobs: usize,
    pub on_error: ErrorPolicy,
}

impl ReportConfig {
    /// Defaults used when no flags are given, ending on `end_date`.
    pub fn with_end_date(end_date: NaiveDate) -> Self {
        Self {
            period: DEFAULT_PERIOD,
            end_date,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            request_delay: Duration::from_millis(50),
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(500),
            },
            jobs: 4,
            on_error: ErrorPolicy::Skip,
        }
    }
}
