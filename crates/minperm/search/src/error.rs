//! Error types for minperm-search.

use minperm_grants::GrantsError;
use minperm_tester::ProvisionError;
use minperm_types::SessionError;
use thiserror::Error;

/// Conditions that end a search without a report.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Provisioning can no longer proceed (administrative connection lost, accounts
    /// cannot be created at all)
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    /// A principal's session was lost mid-batch
    #[error("session lost: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Grants(#[from] GrantsError),

    #[error("invalid search configuration: {0}")]
    Config(String),
}

pub type SearchResult<T> = Result<T, SearchError>;
