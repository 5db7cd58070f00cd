//! Process-level error type.
//!
//! Component errors (`FetchError`, `DecodeError`) are typed enums living next to
//! the code that produces them. Anything that reaches `main` is collapsed into
//! an `AppError`, which only knows a message and the exit code to use.

use crate::data::{DayError, FetchError};

/// Invalid flags or environment overrides.
pub const EXIT_CONFIG: u8 = 2;
/// A date could not be fetched/decoded under `--on-error abort`, or nothing loaded at all.
pub const EXIT_DATA: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(EXIT_DATA, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        Self::data(err.to_string())
    }
}

impl From<DayError> for AppError {
    fn from(err: DayError) -> Self {
        Self::data(err.to_string())
    }
}
