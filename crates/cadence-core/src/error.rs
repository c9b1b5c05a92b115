//! Core error types for cadence-core.
//!
//! Input problems are rejected before any scoring begins and surface as a
//! single [`ValidationError`]. Tasks that merely cannot be placed are not
//! errors; they are reported as dropped tasks in the optimization result.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cadence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid caller input (weights, durations, intervals, ranges)
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dotted configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home directory could not be resolved
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Ranking weights are negative, non-finite, or do not sum to 1.0
    #[error(
        "Invalid ranking weights (priority={priority}, energy={energy}, performance={performance}): {message}"
    )]
    InvalidWeights {
        priority: f64,
        energy: f64,
        performance: f64,
        message: String,
    },

    /// Task duration is not positive or longer than a year
    #[error("Task '{task_id}' has out-of-range duration ({minutes} min)")]
    InvalidDuration { task_id: String, minutes: i64 },

    /// Invalid time range
    #[error("Invalid time range for {what}: end ({end}) must be after start ({start})")]
    InvalidTimeRange {
        what: String,
        start: String,
        end: String,
    },

    /// Two tasks share an identifier
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn value(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
