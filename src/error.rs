//! Error types for the Vitalog engine
//!
//! The analytics core itself degrades to neutral values on bad or sparse
//! data and never fails; these errors cover the storage, serialization,
//! FFI, and CLI surfaces.

use thiserror::Error;

/// Errors raised by the storage and orchestration layers
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Journal I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse journal line {line}: {message}")]
    JournalParseError { line: usize, message: String },

    #[error("Invalid entry: {0}")]
    InvalidEntry(#[from] ValidationError),

    #[error("Unsupported state schema version: {0}")]
    UnsupportedStateVersion(String),
}

/// Entry validation failures (journal loader and `vita validate`)
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid date key (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("Invalid clock time (expected HH:MM): {0}")]
    InvalidTime(String),

    #[error("{field} out of range: {value} (expected {min}..={max})")]
    ScoreOutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
}
