//! Error types for dbopt

use thiserror::Error;

/// Result type alias using DbOptError
pub type Result<T> = std::result::Result<T, DbOptError>;

/// Error type alias for convenience
pub type Error = DbOptError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const RUN_FAILED: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const ACCESS_DENIED: i32 = 4;
}

/// Main error type for dbopt
#[derive(Debug, Error)]
pub enum DbOptError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl DbOptError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            Self::AccessDenied => exit_codes::ACCESS_DENIED,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
