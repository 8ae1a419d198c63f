//! Error types for minperm-tester.

use minperm_grants::GrantsError;
use minperm_types::{Grant, GrantSet, ServerError, SessionError};
use thiserror::Error;

/// Errors from administrative operations (startup checks, scratch database, probes).
#[derive(Debug, Error)]
pub enum TesterError {
    /// The administrative connection failed or was lost
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected an administrative statement
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The administrative account cannot delegate privileges
    #[error("user {user:?} must have GRANT OPTION")]
    MissingGrantOption { user: String },

    /// The server version could not be interpreted
    #[error(transparent)]
    Version(#[from] GrantsError),

    /// The error policy table is inconsistent
    #[error("invalid error policy: {0}")]
    Policy(String),
}

impl From<SessionError> for TesterError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Server(server) => TesterError::Server(server),
            SessionError::Transport(reason) => TesterError::Connection(reason),
        }
    }
}

/// Result type for administrative operations.
pub type TesterResult<T> = Result<T, TesterError>;

/// Failure to materialize (or tear down) a test principal.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The server refused to grant the combination
    #[error("cannot grant {grants}: {source}")]
    Rejected {
        grants: GrantSet,
        source: ServerError,
    },

    /// A grant label cannot be safely written into a GRANT statement
    #[error("grant label {0:?} is not well formed")]
    InvalidGrant(Grant),

    /// The test account itself could not be created, whatever its grants
    #[error("cannot create test account: {0}")]
    Account(ServerError),

    /// The administrative connection failed or was lost
    #[error("connection error: {0}")]
    Connection(String),

    /// Dropping the test account failed
    #[error("cannot drop test account {user}: {reason}")]
    Cleanup { user: String, reason: String },
}

impl ProvisionError {
    /// Errors after which no further combination can be tested.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProvisionError::Account(_) | ProvisionError::Connection(_))
    }
}
