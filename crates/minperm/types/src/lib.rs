//! minperm core types
//!
//! Shared vocabulary for every minperm crate:
//! - [`Grant`] and [`GrantSet`]: privilege labels and ordered combinations of them
//! - [`TestCase`]: one candidate statement and its classification history
//! - [`Outcome`] and [`Verdict`]: the result of running a statement under a grant set
//! - [`ServerError`] and [`SessionError`]: what the server told us when it refused

#![deny(unsafe_code)]

pub mod case;
pub mod error;
pub mod grant;

pub use case::{Outcome, TestCase, Verdict};
pub use error::{ServerError, SessionError};
pub use grant::{Grant, GrantSet};
