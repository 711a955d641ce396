//! Core error types for timeblock-core.
//!
//! Commands on the engine treat stale indices and unknown ids as no-ops, so
//! the variants here cover storage, configuration and the single-timer guard.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timeblock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The countdown was asked to start while its periodic source is live.
    #[error("Countdown is already running")]
    TimerAlreadyRunning,

    /// The engine actor has shut down and can no longer accept commands.
    #[error("Engine runtime is not running")]
    RuntimeClosed,
}

/// Errors raised by a [`DocumentStore`](crate::storage::DocumentStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Reading or writing a document file failed
    #[error("Failed to access {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be encoded
    #[error("Failed to encode document '{document}': {source}")]
    Encode {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors parsing a `timeblock://` control URL.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Malformed control URL '{url}': {message}")]
    Malformed { url: String, message: String },

    #[error("Unknown URL scheme: {0}")]
    UnknownScheme(String),

    #[error("Unknown control command: {0}")]
    UnknownCommand(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
