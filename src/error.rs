//! Error types for mnemo.

use thiserror::Error;

/// mnemo error types.
#[derive(Error, Debug)]
pub enum MnemoError {
    /// Malformed input: wrong pattern length, negative delta or weight,
    /// unknown operand.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Pattern length does not match the network's configured size
    #[error("Pattern length mismatch: expected {expected}, got {got}")]
    PatternLength { expected: usize, got: usize },

    /// A stored invariant was found violated. Fatal for the current operation.
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    /// Protocol signal received out of order
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// Snapshot body could not be encoded or decoded
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blob store I/O failure
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Result type alias for mnemo operations.
pub type Result<T> = std::result::Result<T, MnemoError>;
