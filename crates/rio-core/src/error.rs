//! Error types for the study companion core.

use thiserror::Error;

use crate::timer::TimerError;

/// Result type alias for core operations
pub type RioResult<T> = Result<T, RioError>;

/// Errors surfaced by the core. None of them is fatal to the process: every failure path
/// leaves the caller on its previous, stable state.
#[derive(Error, Debug)]
pub enum RioError {
    /// Malformed telex code or backup file. Nothing was applied.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Persistence unavailable. Callers degrade to in-memory only.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Mentor API failure, timeout or non-success status.
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No user is logged in")]
    NoActiveUser,

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sled::Error> for RioError {
    fn from(err: sled::Error) -> Self {
        RioError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for RioError {
    fn from(err: reqwest::Error) -> Self {
        RioError::Remote(err.to_string())
    }
}

impl From<config::ConfigError> for RioError {
    fn from(err: config::ConfigError) -> Self {
        RioError::Config(err.to_string())
    }
}
