//! The report pipeline: window -> fetch -> decode -> fold.
//!
//! Fetch + decode run per date on a bounded rayon pool. The fold into the
//! aggregate is done afterwards on the calling thread, oldest date first, so
//! the first-occurrence rule for min/max dates does not depend on scheduling.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::data::{CbrClient, DayError, RateSource, decode_daily_rates, fetch_with_retry};
use crate::domain::{DailyRates, ErrorPolicy, ReportConfig, RetryPolicy};
use crate::error::AppError;
use crate::stats::RateAggregate;
use crate::window::LookbackWindow;

/// A date that contributed nothing, and why.
#[derive(Debug)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub error: DayError,
}

/// Everything a single run computed.
#[derive(Debug)]
pub struct RunOutput {
    pub window: LookbackWindow,
    pub aggregate: RateAggregate,
    pub days_loaded: usize,
    pub skipped: Vec<SkippedDay>,
}

/// Run the pipeline against cbr.ru.
pub fn run_report(config: &ReportConfig) -> Result<RunOutput, AppError> {
    let client = CbrClient::new(config)?;
    collect_window(&client, config)
}

/// Run the pipeline against any `RateSource`.
pub fn collect_window(source: &dyn RateSource, config: &ReportConfig) -> Result<RunOutput, AppError> {
    let window = LookbackWindow::ending(config.end_date, config.period).ok_or_else(|| {
        AppError::config(format!(
            "Invalid lookback window: {} days ending {}.",
            config.period, config.end_date
        ))
    })?;
    let dates = window.dates();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|e| AppError::config(format!("Failed to start worker pool: {e}")))?;

    log::info!(
        "Fetching {} daily documents ({} - {}) with {} worker(s)",
        dates.len(),
        window.start,
        window.end,
        config.jobs
    );

    // Under `Abort` the first failure short-circuits the parallel collect.
    let outcomes: Vec<(NaiveDate, Result<DailyRates, DayError>)> = pool
        .install(|| {
            dates
                .par_iter()
                .map(|&date| match load_day(source, date, &config.retry) {
                    Err(err) if config.on_error == ErrorPolicy::Abort => Err(err),
                    outcome => Ok((date, outcome)),
                })
                .collect::<Result<Vec<_>, DayError>>()
        })?;

    let mut aggregate = RateAggregate::new();
    let mut days_loaded = 0;
    let mut skipped = Vec::new();

    for (date, outcome) in outcomes {
        match outcome {
            Ok(day) => {
                if day.date != date {
                    log::debug!("{date}: source returned rates published on {}", day.date);
                }
                aggregate.fold_day(&day);
                days_loaded += 1;
            }
            Err(error) => {
                log::warn!("Skipping {date}: {error}");
                skipped.push(SkippedDay { date, error });
            }
        }
    }

    if days_loaded == 0 {
        return Err(AppError::data(format!(
            "No daily rate documents could be loaded for {} - {}.",
            window.start, window.end
        )));
    }

    log::info!(
        "Loaded {days_loaded}/{} days ({} skipped), {} currencies",
        dates.len(),
        skipped.len(),
        aggregate.len()
    );

    Ok(RunOutput {
        window,
        aggregate,
        days_loaded,
        skipped,
    })
}

fn load_day(source: &dyn RateSource, date: NaiveDate, retry: &RetryPolicy) -> Result<DailyRates, DayError> {
    let bytes = fetch_with_retry(source, date, retry)?;
    let day = decode_daily_rates(&bytes)?;
    log::debug!("{date}: {} quotes", day.entries.len());
    Ok(day)
}
