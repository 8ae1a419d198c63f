//! minperm search
//!
//! Iterative-deepening search for the smallest grant combination each statement
//! needs:
//! - [`SearchDriver`]: walks combination sizes 1, 2, ... testing every unresolved
//!   statement under a freshly provisioned principal per combination
//! - [`SearchReport`] / [`ResultGroups`]: final partition and grouping by grant set
//! - [`CancelFlag`]: cooperative cancellation, observed between combinations
//! - [`SearchObserver`]: progress hooks

#![deny(unsafe_code)]

pub mod cancel;
pub mod config;
pub mod driver;
pub mod error;
pub mod observer;
pub mod results;

pub use cancel::CancelFlag;
pub use config::{SearchConfig, SingleGrantFailure};
pub use driver::SearchDriver;
pub use error::{SearchError, SearchResult};
pub use observer::{BatchSummary, NoopObserver, SearchObserver};
pub use results::{ResultGroup, ResultGroups, SearchReport, StopReason};
