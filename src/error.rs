//! Error types for scattercheck

use thiserror::Error;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for harness operations
#[derive(Error, Debug)]
pub enum Error {
    /// World size must be at least one rank
    #[error("Invalid world size: {0}")]
    InvalidWorldSize(i32),

    /// Invalid root rank for a collective call
    #[error("Invalid root rank: {0}")]
    InvalidRoot(i32),

    /// A per-rank count does not fit in a 32-bit signed integer
    #[error("Count {0} exceeds the 32-bit limit")]
    CountOverflow(u64),

    /// A displacement does not fit in a 32-bit signed integer
    #[error("Displacement {0} exceeds the 32-bit limit")]
    DisplacementOverflow(u64),

    /// The transport rejected the shape of a collective call
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a transport shape error from anything printable.
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }
}
