//! Error types for Synheart Rhythm

use thiserror::Error;

/// Errors that can occur while building an analyzer or computing statistics
#[derive(Debug, Error)]
pub enum RhythmError {
    #[error("Invalid timespec: {0}")]
    InvalidTimespec(String),

    #[error("Invalid night schedule: {0}")]
    InvalidNightSchedule(String),

    #[error("Invalid analysis window: {0}")]
    InvalidWindow(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to parse activity records: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, RhythmError>;
