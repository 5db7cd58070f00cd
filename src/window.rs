//! Lookback window: the consecutive calendar days a report covers.

use chrono::{Days, NaiveDate};

/// Inclusive date range of `period` days ending on `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period: u32,
}

impl LookbackWindow {
    /// Window of `period` days ending on (and including) `end`.
    ///
    /// Returns `None` for a zero period or when the start would fall before
    /// chrono's supported range.
    pub fn ending(end: NaiveDate, period: u32) -> Option<Self> {
        if period == 0 {
            return None;
        }
        let start = end.checked_sub_days(Days::new(u64::from(period - 1)))?;
        Some(Self { start, end, period })
    }

    /// Every date in the window, oldest first.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take(self.period as usize).collect()
    }
}
