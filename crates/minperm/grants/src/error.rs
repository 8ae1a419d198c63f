//! Error types for minperm-grants.

use thiserror::Error;

/// Errors raised while building or indexing a grant universe.
#[derive(Debug, Error)]
pub enum GrantsError {
    /// The server version string has no leading numeric component
    #[error("cannot parse server version {0:?}")]
    VersionParse(String),

    /// A combination referenced a position past the end of the universe
    #[error("grant index {index} out of range for a universe of {len} grants")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type for grant universe operations.
pub type GrantsResult<T> = Result<T, GrantsError>;
