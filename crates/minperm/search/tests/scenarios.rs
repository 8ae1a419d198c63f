//! End-to-end search scenarios against the in-memory provisioner.

mod common;

use common::{grants, universe, MockProvisioner};
use minperm_grants::attempt_bound;
use minperm_search::{
    CancelFlag, SearchConfig, SearchDriver, SearchError, SearchObserver, SingleGrantFailure,
    StopReason,
};
use minperm_tester::{Classifier, ProvisionError};
use minperm_types::{Grant, GrantSet, TestCase};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn driver(provisioner: MockProvisioner, max_depth: usize) -> SearchDriver<MockProvisioner> {
    let config = SearchConfig {
        max_depth,
        ..Default::default()
    };
    SearchDriver::new(provisioner, Classifier::default(), config)
}

fn cases(queries: &[&str]) -> Vec<TestCase> {
    queries.iter().map(|q| TestCase::new(*q)).collect()
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_resolves_at_first_depth() {
    let provisioner = MockProvisioner::new().requires("SELECT 1 FROM t", &["SELECT"]);
    let driver = driver(provisioner, 3);

    let report = driver
        .run(universe(&["SELECT", "INSERT", "UPDATE"]), cases(&["SELECT 1 FROM t"]))
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::AllResolved);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.resolved.len(), 1);
    assert_eq!(report.resolved[0].minimum_grants, Some(grants(&["SELECT"])));
    assert_eq!(report.attempts, 1);
    assert_eq!(report.depth_reached, 1);
}

#[tokio::test]
async fn test_resolves_pair_at_second_depth() {
    let provisioner =
        MockProvisioner::new().requires("INSERT INTO t SELECT * FROM u", &["SELECT", "INSERT"]);
    let driver = driver(provisioner, 10);

    let report = driver
        .run(
            universe(&["SELECT", "INSERT", "UPDATE"]),
            cases(&["INSERT INTO t SELECT * FROM u"]),
        )
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::AllResolved);
    assert_eq!(
        report.resolved[0].minimum_grants,
        Some(grants(&["SELECT", "INSERT"]))
    );
    // three singles, then the first pair
    assert_eq!(report.attempts, 4);

    let groups = report.groups();
    assert_eq!(groups.len(), 1);
    assert!(groups.get("SELECT, INSERT").is_some());
}

#[tokio::test]
async fn test_no_statements_is_trivially_resolved() {
    let provisioner = MockProvisioner::new();
    let driver = driver(provisioner.clone(), 10);

    let report = driver.run(universe(&["SELECT"]), Vec::new()).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::AllResolved);
    assert_eq!(report.attempts, 0);
    assert!(provisioner.ledger().attempted.is_empty());
}

#[tokio::test]
async fn test_unclassified_error_resolves_leniently() {
    let provisioner = MockProvisioner::new().fails_with("SET GLOBAL read_only = 1", 1290);
    let driver = driver(provisioner, 3);

    let report = driver
        .run(universe(&["SELECT", "SUPER"]), cases(&["SET GLOBAL read_only = 1"]))
        .await
        .unwrap();

    assert_eq!(report.resolved.len(), 1);
    assert!(report.resolved[0].unclassified);
    assert_eq!(report.unclassified().count(), 1);
}

// ============================================================================
// Invalid statements
// ============================================================================

#[tokio::test]
async fn test_invalid_statement_is_never_retried() {
    let provisioner = MockProvisioner::new().requires("UPDATE t SET a = 1", &["INSERT", "UPDATE"]);
    let driver = driver(provisioner.clone(), 10);

    let report = driver
        .run(
            universe(&["SELECT", "INSERT", "UPDATE"]),
            cases(&["SELEC 1", "UPDATE t SET a = 1"]),
        )
        .await
        .unwrap();

    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].query, "SELEC 1");
    assert!(report.invalid[0].minimum_grants.is_none());

    let ledger = provisioner.ledger();
    let runs = ledger.executed.iter().filter(|(_, sql)| sql == "SELEC 1").count();
    assert_eq!(runs, 1);
    assert_eq!(ledger.executed[0].0, grants(&["SELECT"]));
}

// ============================================================================
// Pruning
// ============================================================================

#[tokio::test]
async fn test_unprovisionable_grant_is_pruned() {
    let provisioner = MockProvisioner::new()
        .unprovisionable("SUPER")
        .requires("UPDATE t SET a = 1", &["INSERT", "UPDATE"]);
    let driver = driver(provisioner.clone(), 10);

    let report = driver
        .run(
            universe(&["SELECT", "SUPER", "INSERT", "UPDATE"]),
            cases(&["UPDATE t SET a = 1"]),
        )
        .await
        .unwrap();

    assert_eq!(report.pruned, vec![Grant::new("SUPER")]);
    assert_eq!(
        report.resolved[0].minimum_grants,
        Some(grants(&["INSERT", "UPDATE"]))
    );

    let ledger = provisioner.ledger();
    let super_attempts: Vec<&GrantSet> = ledger
        .attempted
        .iter()
        .filter(|set| set.contains(&Grant::new("SUPER")))
        .collect();
    assert_eq!(super_attempts, vec![&grants(&["SUPER"])]);

    // depth 1 stopped at SUPER, so INSERT and UPDATE were never tested alone
    assert_eq!(&ledger.attempted[..2], &[grants(&["SELECT"]), grants(&["SUPER"])]);
    assert!(ledger.attempted[2..].iter().all(|set| set.len() == 2));
}

#[tokio::test]
async fn test_skip_grant_finishes_the_depth() {
    let provisioner = MockProvisioner::new()
        .unprovisionable("SUPER")
        .requires("UPDATE t SET a = 1", &["INSERT", "UPDATE"]);
    let config = SearchConfig {
        max_depth: 10,
        single_grant_failure: SingleGrantFailure::SkipGrant,
    };
    let driver = SearchDriver::new(provisioner.clone(), Classifier::default(), config);

    let report = driver
        .run(
            universe(&["SELECT", "SUPER", "INSERT", "UPDATE"]),
            cases(&["UPDATE t SET a = 1"]),
        )
        .await
        .unwrap();

    assert_eq!(report.pruned, vec![Grant::new("SUPER")]);

    let ledger = provisioner.ledger();
    let singles = ledger.attempted.iter().filter(|set| set.len() == 1).count();
    assert_eq!(singles, 4);
    assert!(ledger
        .attempted
        .iter()
        .filter(|set| set.len() > 1)
        .all(|set| !set.contains(&Grant::new("SUPER"))));
}

#[derive(Default)]
struct CountPruned(AtomicUsize);

impl SearchObserver for CountPruned {
    fn grant_pruned(&self, _grant: &Grant, _error: &ProvisionError) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_rejected_pair_is_skipped_not_pruned() {
    let provisioner = MockProvisioner::new()
        .rejects_together(&["SELECT", "DELETE"])
        .requires("DELETE FROM t WHERE a IN (SELECT b FROM u)", &["DELETE", "FILE"]);
    let observer = Arc::new(CountPruned::default());
    let driver = driver(provisioner.clone(), 10).with_observer(observer.clone());

    let report = driver
        .run(
            universe(&["SELECT", "DELETE", "FILE"]),
            cases(&["DELETE FROM t WHERE a IN (SELECT b FROM u)"]),
        )
        .await
        .unwrap();

    assert!(report.pruned.is_empty());
    assert_eq!(observer.0.load(Ordering::SeqCst), 0);
    assert_eq!(report.stop_reason, StopReason::AllResolved);
    assert_eq!(
        report.resolved[0].minimum_grants,
        Some(grants(&["DELETE", "FILE"]))
    );
    // three singles and three pairs attempted, the first pair never created
    assert_eq!(report.attempts, 6);
    assert_eq!(provisioner.ledger().created, 5);
}

#[tokio::test]
async fn test_pruning_is_reported_to_observer() {
    let provisioner = MockProvisioner::new()
        .unprovisionable("FILE")
        .requires("DELETE FROM t", &["SELECT", "DELETE"]);
    let observer = Arc::new(CountPruned::default());
    let driver = driver(provisioner, 10).with_observer(observer.clone());

    let report = driver
        .run(universe(&["SELECT", "DELETE", "FILE"]), cases(&["DELETE FROM t"]))
        .await
        .unwrap();

    assert_eq!(report.pruned, vec![Grant::new("FILE")]);
    assert_eq!(observer.0.load(Ordering::SeqCst), 1);
    assert_eq!(report.stop_reason, StopReason::AllResolved);
}

// ============================================================================
// Termination and cleanup
// ============================================================================

#[tokio::test]
async fn test_attempts_bounded_when_nothing_resolves() {
    let provisioner = MockProvisioner::new().requires("SHUTDOWN", &["SHUTDOWN"]);
    let driver = driver(provisioner.clone(), 4);
    let universe = universe(&["SELECT", "INSERT", "UPDATE", "DELETE"]);
    let bound = attempt_bound(universe.len(), 4);

    let report = driver.run(universe, cases(&["SHUTDOWN"])).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::DepthExhausted);
    assert_eq!(report.attempts as u128, bound);
    assert_eq!(report.depth_reached, 3);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(
        report.unresolved[0].last_tested_grants,
        Some(grants(&["INSERT", "UPDATE", "DELETE"]))
    );

    let ledger = provisioner.ledger();
    assert_eq!(ledger.created, ledger.destroyed);
    assert_eq!(ledger.begun, ledger.rolled_back);
}

#[tokio::test]
async fn test_depth_never_exceeds_universe() {
    let provisioner = MockProvisioner::new().requires("SHUTDOWN", &["SHUTDOWN"]);
    let driver = driver(provisioner, 10);

    let report = driver
        .run(universe(&["SELECT", "INSERT"]), cases(&["SHUTDOWN"]))
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::DepthExhausted);
    assert_eq!(report.depth_reached, 2);
    assert_eq!(report.attempts, 3);
}

#[tokio::test]
async fn test_cancellation_between_combinations() {
    struct CancelAt {
        depth: usize,
        index: u128,
        flag: CancelFlag,
        seen: Mutex<Vec<(usize, u128)>>,
    }
    impl SearchObserver for CancelAt {
        fn combination_started(&self, depth: usize, index: u128, _total: u128, _grants: &GrantSet) {
            self.seen.lock().unwrap().push((depth, index));
            if depth == self.depth && index == self.index {
                self.flag.cancel();
            }
        }
    }

    let provisioner = MockProvisioner::new()
        .requires("SELECT 1", &["SELECT"])
        .requires("ALTER TABLE t ADD c INT", &["DELETE", "ALTER"]);
    let flag = CancelFlag::new();
    let observer = Arc::new(CancelAt {
        depth: 2,
        index: 5,
        flag: flag.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let driver = driver(provisioner.clone(), 10)
        .with_cancel_flag(flag)
        .with_observer(observer.clone());

    let report = driver
        .run(
            universe(&["SELECT", "INSERT", "UPDATE", "DELETE", "ALTER"]),
            cases(&["SELECT 1", "ALTER TABLE t ADD c INT"]),
        )
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    // five singles, then pairs 1..=5 of 10
    assert_eq!(report.attempts, 10);
    assert_eq!(observer.seen.lock().unwrap().last(), Some(&(2, 5)));

    // the fifth pair's batch still ran, and earlier results survive
    let ledger = provisioner.ledger();
    assert_eq!(ledger.created, 10);
    assert_eq!(ledger.destroyed, 10);
    assert_eq!(
        ledger.executed.last().map(|(set, _)| set.clone()),
        Some(grants(&["INSERT", "UPDATE"]))
    );
    assert_eq!(report.resolved.len(), 1);
    assert_eq!(report.resolved[0].query, "SELECT 1");
    assert_eq!(report.unresolved.len(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let provisioner = MockProvisioner::new().requires("SELECT 1", &["SELECT"]);
    let flag = CancelFlag::new();
    flag.cancel();
    let driver = driver(provisioner.clone(), 10).with_cancel_flag(flag);

    let report = driver
        .run(universe(&["SELECT"]), cases(&["SELECT 1"]))
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.attempts, 0);
    assert_eq!(report.unresolved.len(), 1);
}

#[tokio::test]
async fn test_lost_admin_connection_is_fatal() {
    let provisioner = MockProvisioner::new()
        .requires("SHUTDOWN", &["SHUTDOWN"])
        .connection_lost_at(3);
    let driver = driver(provisioner.clone(), 10);

    let err = driver
        .run(universe(&["SELECT", "INSERT", "UPDATE"]), cases(&["SHUTDOWN"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::Provision(ProvisionError::Connection(_))
    ));
    let ledger = provisioner.ledger();
    assert_eq!(ledger.created, 2);
    assert_eq!(ledger.destroyed, 2);
}

#[tokio::test]
async fn test_lost_session_destroys_principal() {
    let provisioner = MockProvisioner::new();
    let driver = driver(provisioner.clone(), 10);

    let err = driver
        .run(universe(&["SELECT"]), cases(&["BOOM", "SELECT 1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Session(_)));
    let ledger = provisioner.ledger();
    assert_eq!(ledger.created, 1);
    assert_eq!(ledger.destroyed, 1);
    assert_eq!(ledger.rolled_back, 1);
}

#[tokio::test]
async fn test_every_execution_is_rolled_back() {
    let provisioner = MockProvisioner::new()
        .requires("INSERT INTO t VALUES (1)", &["INSERT"])
        .requires("UPDATE t SET a = 2", &["SELECT", "UPDATE"]);
    let driver = driver(provisioner.clone(), 10);

    driver
        .run(
            universe(&["SELECT", "INSERT", "UPDATE"]),
            cases(&["INSERT INTO t VALUES (1)", "UPDATE t SET a = 2", "SELEC x"]),
        )
        .await
        .unwrap();

    let ledger = provisioner.ledger();
    assert_eq!(ledger.begun, ledger.executed.len());
    assert_eq!(ledger.rolled_back, ledger.executed.len());
}
