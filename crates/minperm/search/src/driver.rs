//! Iterative-deepening search driver.
//!
//! For each combination size `depth` in `1..max_depth`, every combination of the
//! current universe is provisioned as a throwaway principal and every unresolved
//! statement is classified under it. A statement leaves the unresolved set the first
//! time it is allowed (resolved) or found invalid; it is never tested again.

use crate::cancel::CancelFlag;
use crate::config::{SearchConfig, SingleGrantFailure};
use crate::error::SearchResult;
use crate::observer::{BatchSummary, NoopObserver, SearchObserver};
use crate::results::{SearchReport, StopReason};
use minperm_grants::{binomial, Combinations, GrantUniverse};
use minperm_tester::{Classifier, Principal, Provisioner};
use minperm_types::{Grant, GrantSet, Outcome, TestCase};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Mutable state of one run, owned by the driver.
#[derive(Debug, Default)]
struct SearchState {
    unresolved: Vec<TestCase>,
    resolved: Vec<TestCase>,
    invalid: Vec<TestCase>,
    pruned: Vec<Grant>,
    attempts: u64,
    depth: usize,
}

/// How one depth phase ended.
enum DepthEnd {
    Completed,
    Aborted,
    AllResolved,
    Cancelled,
}

pub struct SearchDriver<P: Provisioner> {
    provisioner: P,
    classifier: Classifier,
    config: SearchConfig,
    cancel: CancelFlag,
    observer: Arc<dyn SearchObserver>,
}

impl<P: Provisioner> SearchDriver<P> {
    pub fn new(provisioner: P, classifier: Classifier, config: SearchConfig) -> Self {
        Self {
            provisioner,
            classifier,
            config,
            cancel: CancelFlag::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Search for the minimum grants of every statement in `cases`.
    ///
    /// Errors are returned only for conditions under which no further combination
    /// can be tested; every principal created up to that point has been destroyed.
    pub async fn run(
        &self,
        mut universe: GrantUniverse,
        cases: Vec<TestCase>,
    ) -> SearchResult<SearchReport> {
        self.config.validate()?;

        let mut state = SearchState {
            unresolved: cases,
            ..Default::default()
        };

        info!(
            statements = state.unresolved.len(),
            grants = universe.len(),
            max_depth = self.config.max_depth,
            "Starting search"
        );

        let stop_reason = self.search(&mut universe, &mut state).await?;

        info!(
            %stop_reason,
            resolved = state.resolved.len(),
            invalid = state.invalid.len(),
            unresolved = state.unresolved.len(),
            attempts = state.attempts,
            "Search finished"
        );

        Ok(SearchReport {
            resolved: state.resolved,
            invalid: state.invalid,
            unresolved: state.unresolved,
            pruned: state.pruned,
            attempts: state.attempts,
            depth_reached: state.depth,
            stop_reason,
        })
    }

    async fn search(
        &self,
        universe: &mut GrantUniverse,
        state: &mut SearchState,
    ) -> SearchResult<StopReason> {
        if state.unresolved.is_empty() {
            return Ok(StopReason::AllResolved);
        }

        for depth in 1..self.config.max_depth {
            if self.cancel.is_cancelled() {
                return Ok(StopReason::Cancelled);
            }
            if depth > universe.len() {
                break;
            }

            state.depth = depth;
            let mut deferred = Vec::new();
            let end = self.run_depth(depth, universe, state, &mut deferred).await;

            // Deferred prunes apply even when the depth ended early.
            for grant in deferred {
                universe.remove(&grant);
                state.pruned.push(grant);
            }

            match end? {
                DepthEnd::AllResolved => return Ok(StopReason::AllResolved),
                DepthEnd::Cancelled => return Ok(StopReason::Cancelled),
                DepthEnd::Aborted => info!(depth, "Depth aborted after pruning"),
                DepthEnd::Completed => {}
            }
        }

        Ok(StopReason::DepthExhausted)
    }

    async fn run_depth(
        &self,
        depth: usize,
        universe: &mut GrantUniverse,
        state: &mut SearchState,
        deferred: &mut Vec<Grant>,
    ) -> SearchResult<DepthEnd> {
        let total = binomial(universe.len(), depth);
        info!(depth, combinations = %total, grants = universe.len(), "Starting depth");
        self.observer.depth_started(depth, total);

        for (position, indices) in Combinations::new(universe.len(), depth).enumerate() {
            if self.cancel.is_cancelled() {
                info!(depth, "Cancellation requested");
                return Ok(DepthEnd::Cancelled);
            }

            let grants = universe.select(&indices)?;
            let index = position as u128 + 1;
            info!(depth, index = %index, total = %total, grants = %grants, "Testing combination");
            self.observer.combination_started(depth, index, total, &grants);
            state.attempts += 1;

            let principal = match self.provisioner.create(&grants).await {
                Ok(principal) => principal,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    if let Some(grant) = single_grant(&grants) {
                        self.observer.grant_pruned(grant, &e);
                        match self.config.single_grant_failure {
                            SingleGrantFailure::AbortDepth => {
                                warn!(grant = %grant, error = %e, "Pruning grant, aborting depth");
                                universe.remove(grant);
                                state.pruned.push(grant.clone());
                                return Ok(DepthEnd::Aborted);
                            }
                            SingleGrantFailure::SkipGrant => {
                                warn!(grant = %grant, error = %e, "Pruning grant at end of depth");
                                deferred.push(grant.clone());
                            }
                        }
                    } else {
                        warn!(grants = %grants, error = %e, "Skipping combination");
                    }
                    continue;
                }
            };

            let summary = self.run_batch(principal, state).await?;
            debug!(
                grants = %grants,
                allowed = summary.allowed,
                denied = summary.denied,
                invalid = summary.invalid,
                unresolved = state.unresolved.len(),
                "Batch finished"
            );
            self.observer
                .batch_finished(&grants, summary, state.unresolved.len());

            if state.unresolved.is_empty() {
                return Ok(DepthEnd::AllResolved);
            }
        }

        Ok(DepthEnd::Completed)
    }

    /// Classify every unresolved statement under `principal`, then destroy it.
    async fn run_batch(
        &self,
        mut principal: P::Principal,
        state: &mut SearchState,
    ) -> SearchResult<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut failure = None;
        let mut pending = std::mem::take(&mut state.unresolved).into_iter();

        for mut case in pending.by_ref() {
            match self.classifier.classify(&mut principal, &mut case).await {
                Ok(Outcome::Allowed) => {
                    summary.allowed += 1;
                    state.resolved.push(case);
                }
                Ok(Outcome::Invalid) => {
                    summary.invalid += 1;
                    warn!(query = %case.query, "Statement is invalid, excluding it");
                    state.invalid.push(case);
                }
                Ok(Outcome::Denied) => {
                    summary.denied += 1;
                    state.unresolved.push(case);
                }
                Err(e) => {
                    state.unresolved.push(case);
                    failure = Some(e);
                    break;
                }
            }
        }
        state.unresolved.extend(pending);

        let user = principal.user().to_string();
        if let Err(e) = self.provisioner.destroy(principal).await {
            warn!(user, error = %e, "Failed to destroy test principal");
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(summary),
        }
    }
}

fn single_grant(grants: &GrantSet) -> Option<&Grant> {
    match grants.as_slice() {
        [grant] => Some(grant),
        _ => None,
    }
}
