//! Terminal progress for the search

use crate::output::print_warning;
use indicatif::{ProgressBar, ProgressStyle};
use minperm_search::{BatchSummary, SearchObserver};
use minperm_tester::ProvisionError;
use minperm_types::{Grant, GrantSet};
use std::time::Duration;

/// Spinner showing the depth and combination under test.
pub struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message("Starting search...");
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SearchObserver for SpinnerObserver {
    fn depth_started(&self, depth: usize, combinations: u128) {
        self.bar
            .set_message(format!("Depth {depth}: {combinations} combinations"));
    }

    fn combination_started(&self, depth: usize, index: u128, total: u128, grants: &GrantSet) {
        self.bar
            .set_message(format!("Depth {depth}: {index}/{total} [{grants}]"));
    }

    fn grant_pruned(&self, grant: &Grant, error: &ProvisionError) {
        self.bar.suspend(|| {
            print_warning(&format!("Pruning {grant}: {error}"));
        });
    }

    fn batch_finished(&self, _grants: &GrantSet, summary: BatchSummary, unresolved: usize) {
        if summary.allowed > 0 {
            self.bar.println(format!(
                "  resolved {} statement(s), {unresolved} left",
                summary.allowed
            ));
        }
    }
}

impl Drop for SpinnerObserver {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
