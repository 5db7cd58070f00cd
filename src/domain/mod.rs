//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - decoded daily documents (`DailyRates`, `DailyRateEntry`)
//! - per-currency statistics (`CurrencyStat`, `Extreme`)
//! - run configuration (`ReportConfig`, `RetryPolicy`, `ErrorPolicy`)

pub mod types;

pub use types::*;
