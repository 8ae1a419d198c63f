//! minperm tester
//!
//! Everything that touches a server on behalf of one grant combination:
//! - [`Provisioner`] / [`Principal`]: create and drop an account holding exactly one
//!   grant set, with one session bound to it
//! - [`Session`]: begin / execute / rollback on that session
//! - [`ErrorPolicy`]: declarative server error code to [`Outcome`] table
//! - [`Classifier`]: runs a statement inside a rolled-back transaction and classifies it
//!
//! The `mysql` feature (on by default) provides the sqlx-backed implementations.
//!
//! [`Outcome`]: minperm_types::Outcome

#![deny(unsafe_code)]

pub mod classifier;
pub mod error;
pub mod policy;
pub mod provision;
pub mod session;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use classifier::Classifier;
pub use error::{ProvisionError, TesterError, TesterResult};
pub use policy::{ErrorPolicy, ErrorRule};
pub use provision::{Principal, Provisioner};
pub use session::Session;
