//! minperm statement readers
//!
//! Turn the places statements usually live into ordered [`TestCase`] lists:
//! - [`slow`]: MySQL slow query log, one case per distinct fingerprint
//! - [`general`]: MySQL general query log, every `Query` entry
//! - [`plain`]: a file of `;`-terminated statements
//!
//! [`TestCase`]: minperm_types::TestCase

#![deny(unsafe_code)]

pub mod error;
pub mod fingerprint;
pub mod general;
mod lines;
pub mod plain;
pub mod slow;
mod source;

pub use error::{ReadError, ReadResult};
pub use fingerprint::fingerprint;
pub use source::{expand_home, Source};
