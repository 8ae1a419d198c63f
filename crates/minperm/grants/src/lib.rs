//! minperm grant universe
//!
//! The candidate privilege space for a search:
//! - [`ServerVersion`]: parses `SELECT VERSION()` output into a comparable version
//! - [`GrantUniverse`]: the ordered, version-gated list of grantable privileges
//! - [`Combinations`]: lexicographic enumeration of fixed-size index tuples
//!
//! Universe order is load-bearing: combination order, and therefore which of several
//! equally small grant sets resolves a statement first, follows it.

#![deny(unsafe_code)]

pub mod combination;
pub mod error;
pub mod universe;
pub mod version;

pub use combination::{attempt_bound, binomial, Combinations};
pub use error::{GrantsError, GrantsResult};
pub use universe::{GrantUniverse, BASE_GRANTS, MYSQL_80_GRANTS};
pub use version::{Flavor, ServerVersion};
