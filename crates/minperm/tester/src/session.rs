//! The single session owned by a test principal.

use async_trait::async_trait;
use minperm_types::SessionError;

/// One server session. Calls are serialized: a principal never runs two
/// statements at once.
#[async_trait]
pub trait Session: Send {
    /// Open a transaction.
    async fn begin(&mut self) -> Result<(), SessionError>;

    /// Run statement text verbatim.
    async fn execute(&mut self, sql: &str) -> Result<(), SessionError>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> Result<(), SessionError>;
}
