//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during admission and job control
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Request rejected before queueing (bad capture kind, blank required field)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown meeting or job
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store error during admission
    #[error("Store error: {0}")]
    Store(String),
}
