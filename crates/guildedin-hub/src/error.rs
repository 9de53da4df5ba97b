//! Error types for guildedin-hub

use guildedin_core::RunId;
use thiserror::Error;

/// Result type for guildedin-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in guildedin-hub
#[derive(Debug, Error)]
pub enum Error {
    /// No run registered under this id
    #[error("{0} not found")]
    RunNotFound(RunId),

    /// A run with this id is already registered
    #[error("{0} already registered")]
    RunExists(RunId),

    /// A thread panicked while holding a run's lock
    #[error("lock poisoned for {0}")]
    LockPoisoned(RunId),

    /// A snapshot could not be encoded or decoded
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Core error (validation, rollback or integrity)
    #[error("core error: {0}")]
    Core(#[from] guildedin_core::Error),
}

impl Error {
    /// True when the caller can carry on by submitting another plan
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Core(err) => err.is_recoverable(),
            Error::RunNotFound(_) | Error::RunExists(_) => true,
            Error::LockPoisoned(_) | Error::Snapshot(_) => false,
        }
    }

    /// The plan validation error, if this is one
    pub fn validation(&self) -> Option<&guildedin_core::ValidationError> {
        match self {
            Error::Core(err) => err.validation(),
            _ => None,
        }
    }
}

impl From<guildedin_core::IntegrityViolation> for Error {
    fn from(err: guildedin_core::IntegrityViolation) -> Self {
        Error::Core(err.into())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Snapshot(err.to_string())
    }
}

// Compile-time check that Error is Send + Sync for thread-safe error propagation.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
