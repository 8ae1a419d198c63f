//! In-memory provisioner and sessions for driving searches without a server.
//!
//! A statement's required grants are registered up front; a session allows it when
//! its principal holds all of them and denies it otherwise. `SELEC ...` is a syntax
//! error and `BOOM` drops the session.

#![allow(dead_code)]

use async_trait::async_trait;
use minperm_grants::GrantUniverse;
use minperm_tester::{Principal, ProvisionError, Provisioner, Session};
use minperm_types::{Grant, GrantSet, ServerError, SessionError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn grants(labels: &[&str]) -> GrantSet {
    GrantSet::new(labels.iter().map(|l| Grant::new(l)))
}

pub fn universe(labels: &[&str]) -> GrantUniverse {
    GrantUniverse::from_grants(labels.iter().map(|l| Grant::new(l)))
}

/// Everything the mock saw, shared between the provisioner and its sessions.
#[derive(Debug, Default)]
pub struct Ledger {
    pub attempted: Vec<GrantSet>,
    pub created: usize,
    pub destroyed: usize,
    pub executed: Vec<(GrantSet, String)>,
    pub begun: usize,
    pub rolled_back: usize,
}

#[derive(Clone, Default)]
pub struct MockProvisioner {
    requirements: Arc<HashMap<String, GrantSet>>,
    server_errors: Arc<HashMap<String, u16>>,
    rejected: Vec<GrantSet>,
    connection_lost_at: Option<usize>,
    pub ledger: Arc<Mutex<Ledger>>,
}

impl MockProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `query` succeeds only under a grant set containing `required`.
    pub fn requires(mut self, query: &str, required: &[&str]) -> Self {
        Arc::make_mut(&mut self.requirements).insert(query.to_string(), grants(required));
        self
    }

    /// `query` always fails with server error `code`.
    pub fn fails_with(mut self, query: &str, code: u16) -> Self {
        Arc::make_mut(&mut self.server_errors).insert(query.to_string(), code);
        self
    }

    /// Any combination containing `grant` is rejected by the server.
    pub fn unprovisionable(mut self, grant: &str) -> Self {
        self.rejected.push(grants(&[grant]));
        self
    }

    /// Any combination containing all of `labels` is rejected by the server.
    pub fn rejects_together(mut self, labels: &[&str]) -> Self {
        self.rejected.push(grants(labels));
        self
    }

    /// The administrative connection drops on the `attempt`-th create (1-based).
    pub fn connection_lost_at(mut self, attempt: usize) -> Self {
        self.connection_lost_at = Some(attempt);
        self
    }

    pub fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap()
    }
}

#[async_trait]
impl Provisioner for MockProvisioner {
    type Principal = MockPrincipal;

    async fn create(&self, grants: &GrantSet) -> Result<MockPrincipal, ProvisionError> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.attempted.push(grants.clone());

        if self.connection_lost_at == Some(ledger.attempted.len()) {
            return Err(ProvisionError::Connection("server has gone away".into()));
        }
        if let Some(bad) = self
            .rejected
            .iter()
            .find(|set| set.iter().all(|g| grants.contains(g)))
        {
            return Err(ProvisionError::Rejected {
                grants: grants.clone(),
                source: ServerError::new(1227, format!("you need the {bad} privilege")),
            });
        }

        ledger.created += 1;
        Ok(MockPrincipal {
            user: format!("mock_{}", ledger.created),
            grants: grants.clone(),
            session: MockSession {
                grants: grants.clone(),
                requirements: Arc::clone(&self.requirements),
                server_errors: Arc::clone(&self.server_errors),
                ledger: Arc::clone(&self.ledger),
            },
        })
    }

    async fn destroy(&self, _principal: MockPrincipal) -> Result<(), ProvisionError> {
        self.ledger.lock().unwrap().destroyed += 1;
        Ok(())
    }
}

pub struct MockPrincipal {
    user: String,
    grants: GrantSet,
    session: MockSession,
}

impl Principal for MockPrincipal {
    type Session = MockSession;

    fn user(&self) -> &str {
        &self.user
    }

    fn grants(&self) -> &GrantSet {
        &self.grants
    }

    fn session(&mut self) -> Result<&mut MockSession, ServerError> {
        Ok(&mut self.session)
    }
}

pub struct MockSession {
    grants: GrantSet,
    requirements: Arc<HashMap<String, GrantSet>>,
    server_errors: Arc<HashMap<String, u16>>,
    ledger: Arc<Mutex<Ledger>>,
}

#[async_trait]
impl Session for MockSession {
    async fn begin(&mut self) -> Result<(), SessionError> {
        self.ledger.lock().unwrap().begun += 1;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        self.ledger
            .lock()
            .unwrap()
            .executed
            .push((self.grants.clone(), sql.to_string()));

        if sql == "BOOM" {
            return Err(SessionError::Transport("connection reset by peer".into()));
        }
        if sql.starts_with("SELEC ") {
            return Err(ServerError::new(1064, "You have an error in your SQL syntax").into());
        }
        if let Some(&code) = self.server_errors.get(sql) {
            return Err(ServerError::new(code, "refused").into());
        }
        match self.requirements.get(sql) {
            Some(required) if !required.iter().all(|g| self.grants.contains(g)) => {
                Err(ServerError::new(1142, "command denied").into())
            }
            _ => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<(), SessionError> {
        self.ledger.lock().unwrap().rolled_back += 1;
        Ok(())
    }
}
