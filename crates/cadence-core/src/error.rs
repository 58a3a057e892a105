//! Core error types for cadence-core.
//!
//! The engine itself only ever fails with [`EngineError`]: local validation
//! failures on otherwise-pure computations. Everything that touches disk or
//! the database is wrapped by [`CoreError`] at the host layer.

use std::path::PathBuf;
use thiserror::Error;

/// Validation failures raised by the pure scheduling and progression engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed frequency policy
    #[error("Invalid frequency policy: {0}")]
    InvalidPolicy(String),

    /// Negative XP total
    #[error("Invalid XP total: {0} (must be non-negative)")]
    InvalidXp(i64),

    /// Malformed reminder interval
    #[error("Invalid schedule spec: {0}")]
    InvalidScheduleSpec(String),
}

/// Core error type for cadence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Engine validation errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

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

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
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

    /// No entity with the given id
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A stored body could not be decoded
    #[error("Corrupt {kind} record '{id}': {message}")]
    Corrupt {
        kind: &'static str,
        id: String,
        message: String,
    },

    /// Could not resolve the data directory
    #[error("Failed to access data directory: {0}")]
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
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
