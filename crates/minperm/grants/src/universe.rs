//! The candidate privilege vocabulary.

use crate::combination::Combinations;
use crate::error::{GrantsError, GrantsResult};
use crate::version::{Flavor, ServerVersion};
use minperm_types::{Grant, GrantSet};
use tracing::debug;

/// Static privileges grantable `ON *.*`, in enumeration order.
pub const BASE_GRANTS: &[&str] = &[
    "SELECT",
    "INSERT",
    "DELETE",
    "UPDATE",
    "ALTER",
    "ALTER ROUTINE",
    "CREATE",
    "CREATE ROUTINE",
    "CREATE TABLESPACE",
    "CREATE TEMPORARY TABLES",
    "CREATE USER",
    "CREATE VIEW",
    "DROP",
    "EVENT",
    "EXECUTE",
    "FILE",
    "GRANT OPTION",
    "INDEX",
    "LOCK TABLES",
    "PROCESS",
    "REFERENCES",
    "RELOAD",
    "REPLICATION CLIENT",
    "REPLICATION SLAVE",
    "SHOW DATABASES",
    "SHOW VIEW",
    "SHUTDOWN",
    "SUPER",
    "TRIGGER",
    "USAGE",
];

/// Dynamic privileges available from MySQL 8.0.0 on. MariaDB has none of them.
pub const MYSQL_80_GRANTS: &[&str] = &[
    "BINLOG_ADMIN",
    "CONNECTION_ADMIN",
    "ENCRYPTION_KEY_ADMIN",
    "GROUP_REPLICATION_ADMIN",
    "REPLICATION_SLAVE_ADMIN",
    "ROLE_ADMIN",
    "SET_USER_ID",
    "SYSTEM_VARIABLES_ADMIN",
];

/// Ordered, duplicate-free set of grants under consideration.
///
/// Only ever shrinks during a run (see [`GrantUniverse::remove`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantUniverse {
    grants: Vec<Grant>,
}

impl GrantUniverse {
    /// Universe for the server that reported `version`.
    pub fn enumerate(version: &str) -> GrantsResult<Self> {
        let parsed = ServerVersion::parse(version)?;
        Ok(Self::for_version(&parsed))
    }

    pub fn for_version(version: &ServerVersion) -> Self {
        let mut labels: Vec<&str> = BASE_GRANTS.to_vec();
        if version.flavor() == Flavor::MySql && version.at_least(8, 0, 0) {
            labels.extend_from_slice(MYSQL_80_GRANTS);
        }

        let universe = Self::from_grants(labels.into_iter().map(Grant::new));
        debug!(version = %version, grants = universe.len(), "Enumerated grant universe");
        universe
    }

    /// Universe from an explicit list; repeated labels keep their first position.
    pub fn from_grants(grants: impl IntoIterator<Item = Grant>) -> Self {
        let mut unique: Vec<Grant> = Vec::new();
        for grant in grants {
            if !unique.contains(&grant) {
                unique.push(grant);
            }
        }
        Self { grants: unique }
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn contains(&self, grant: &Grant) -> bool {
        self.grants.contains(grant)
    }

    /// Prune a grant. Returns false if it was not present.
    pub fn remove(&mut self, grant: &Grant) -> bool {
        match self.grants.iter().position(|g| g == grant) {
            Some(index) => {
                self.grants.remove(index);
                true
            }
            None => false,
        }
    }

    /// Map an index tuple from [`Combinations`] to the grants it names.
    pub fn select(&self, indices: &[usize]) -> GrantsResult<GrantSet> {
        indices
            .iter()
            .map(|&index| {
                self.grants
                    .get(index)
                    .cloned()
                    .ok_or(GrantsError::IndexOutOfRange {
                        index,
                        len: self.grants.len(),
                    })
            })
            .collect::<GrantsResult<Vec<_>>>()
            .map(GrantSet::new)
    }

    /// Every grant set of size `k`, in enumeration order.
    pub fn combinations(&self, k: usize) -> impl Iterator<Item = GrantSet> + '_ {
        Combinations::new(self.grants.len(), k)
            .map(move |indices| GrantSet::new(indices.into_iter().map(|i| self.grants[i].clone())))
    }
}
