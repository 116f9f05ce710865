//! The module contains the errors the engine can return.
//!
//! The normalizer, reconciler and paginator never fail: malformed input
//! falls back to defaults. Errors only come from date validation and from
//! the CSV writer.
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<csv::Error> for EngineError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value.to_string())
    }
}
