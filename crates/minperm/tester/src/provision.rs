//! Test principal provisioning contract.

use crate::error::ProvisionError;
use crate::session::Session;
use async_trait::async_trait;
use minperm_types::{GrantSet, ServerError};

/// An ephemeral account holding exactly one grant set.
pub trait Principal: Send {
    type Session: Session;

    /// Account name on the server
    fn user(&self) -> &str;

    /// The grants this principal was created with
    fn grants(&self) -> &GrantSet;

    /// The principal's session, or the server's reason for refusing to open one.
    ///
    /// A refused session is not a provisioning failure: the account exists, it just
    /// cannot do anything, and every statement is classified from that refusal.
    fn session(&mut self) -> Result<&mut Self::Session, ServerError>;
}

/// Creates and destroys test principals.
///
/// `destroy` must be called on every path once `create` succeeded, and must be
/// idempotent. Implementations clean up after themselves when `create` fails
/// half-way.
#[async_trait]
pub trait Provisioner: Send + Sync {
    type Principal: Principal;

    /// Create a principal holding exactly `grants`.
    async fn create(&self, grants: &GrantSet) -> Result<Self::Principal, ProvisionError>;

    /// Close the principal's session and drop the account.
    async fn destroy(&self, principal: Self::Principal) -> Result<(), ProvisionError>;
}
