//! `cbr-rates` library crate.
//!
//! The binary (`rates`) is a thin wrapper around this library so that the
//! pipeline can be driven in tests with a fake rate source.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod report;
pub mod stats;
pub mod window;
