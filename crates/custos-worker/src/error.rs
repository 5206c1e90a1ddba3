//! Error types for worker operations

use thiserror::Error;

/// Errors that can occur while driving the pipeline
///
/// Processing failures of an individual job are not errors here: they are
/// recorded on the job. These variants cover the cycle's own bookkeeping.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Storage layer error outside a job's processing transaction
    #[error("Storage error: {0}")]
    Store(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
