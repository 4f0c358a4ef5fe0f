//! Error types for filekv
//!
//! Provides a unified error type for all store operations.

use thiserror::Error;

/// Result type alias using FileKvError
pub type Result<T> = std::result::Result<T, FileKvError>;

/// Unified error type for filekv operations
#[derive(Debug, Error)]
pub enum FileKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    #[error("Record {field} too large: {len} bytes")]
    RecordTooLarge { field: &'static str, len: usize },

    /// The log file length no longer matches what this store has written.
    #[error("Log file out of sync: expected {expected} bytes, found {actual}")]
    LogDesync { expected: u64, actual: u64 },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FileKvError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        FileKvError::CorruptRecord {
            offset,
            reason: reason.into(),
        }
    }
}
