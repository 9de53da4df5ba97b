//! Error types for guildedin-journal

use thiserror::Error;

/// Journal error type
#[derive(Debug, Error)]
pub enum Error {
    /// The journal can't be replayed as given
    #[error("Replay error: {0}")]
    Replay(String),

    /// A replayed day did not match the recorded one
    #[error("Replay diverged on day {day}: {reason}")]
    Divergence { day: u32, reason: String },

    /// Export error
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The controller refused an operation
    #[error("Hub error: {0}")]
    Hub(#[from] guildedin_hub::Error),
}

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, Error>;
