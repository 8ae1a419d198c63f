//! Progress hooks for the search driver.

use minperm_tester::ProvisionError;
use minperm_types::{Grant, GrantSet};

/// Outcome counts for one combination's batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub allowed: usize,
    pub denied: usize,
    pub invalid: usize,
}

/// Receives search events. Every method defaults to doing nothing.
pub trait SearchObserver: Send + Sync {
    fn depth_started(&self, _depth: usize, _combinations: u128) {}

    /// `index` is 1-based within the depth.
    fn combination_started(&self, _depth: usize, _index: u128, _total: u128, _grants: &GrantSet) {}

    fn grant_pruned(&self, _grant: &Grant, _error: &ProvisionError) {}

    fn batch_finished(&self, _grants: &GrantSet, _summary: BatchSummary, _unresolved: usize) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}
