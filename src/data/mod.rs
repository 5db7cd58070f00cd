//! Data access: fetching and decoding the CBR daily rates document.

pub mod cbr;
pub mod decode;

pub use cbr::*;
pub use decode::*;

use thiserror::Error;

/// Why a single date contributed nothing to the report.
#[derive(Debug, Error)]
pub enum DayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
