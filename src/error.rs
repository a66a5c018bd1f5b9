//! Error types shared by configuration, ingestion, and the solver.

use std::io;

use thiserror::Error;

/// Configuration error with field path and constraint description.
///
/// Raised while a model or run is being built, never once stepping has
/// started.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.mass_kg"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Input time-series error: a missing, non-finite, or misaligned sample.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("data error at row {row}: {message}")]
pub struct DataError {
    /// Zero-based index of the offending record.
    pub row: usize,
    /// Human-readable description.
    pub message: String,
}

impl DataError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

/// Top-level error for anything that can stop a run from producing results.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("run cancelled before step {step}")]
    Cancelled { step: usize },
}
