//! Reporting: turn the aggregate into numbered rows and render them.

pub mod format;

pub use format::*;

use crate::domain::Extreme;
use crate::stats::RateAggregate;

/// One line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// 1-based row number.
    pub index: usize,
    pub code: String,
    pub min: Extreme,
    pub max: Extreme,
    /// `sum / period`.
    pub average: f64,
}

/// Rows in currency-code order, averaged over the full `period`.
pub fn build_rows(aggregate: &RateAggregate, period: u32) -> Vec<ReportRow> {
    aggregate
        .iter()
        .enumerate()
        .map(|(i, (code, stat))| ReportRow {
            index: i + 1,
            code: code.to_string(),
            min: stat.min,
            max: stat.max,
            average: stat.average(period),
        })
        .collect()
}
