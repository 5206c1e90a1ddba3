//! Memory index error types

use thiserror::Error;

/// Errors that can occur while indexing or querying captures
#[derive(Error, Debug)]
pub enum IndexError {
    /// Input that cannot be embedded
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding has the wrong length for the index
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Index state unavailable (poisoned lock)
    #[error("Index error: {0}")]
    Internal(String),
}
