//! Test cases and classification outcomes.

use crate::error::ServerError;
use crate::grant::GrantSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way verdict for one statement under one grant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The statement ran, or failed for a reason no extra privilege would fix
    Allowed,
    /// The server refused the statement for lack of privileges
    Denied,
    /// The statement can never run (e.g. a syntax error)
    Invalid,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Allowed => f.write_str("allowed"),
            Outcome::Denied => f.write_str("denied"),
            Outcome::Invalid => f.write_str("invalid"),
        }
    }
}

/// An outcome together with the evidence it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,

    /// The server error behind the outcome, if the statement failed
    pub error: Option<ServerError>,

    /// True when the error code had no entry in the error policy and the
    /// policy's default outcome was applied
    pub unclassified: bool,
}

impl Verdict {
    /// The statement ran without error.
    pub fn success() -> Self {
        Self {
            outcome: Outcome::Allowed,
            error: None,
            unclassified: false,
        }
    }
}

/// One candidate statement and everything learned about it so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Database the statement was observed against (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Literal statement text, executed verbatim
    pub query: String,

    /// Normalized identity used to deduplicate log input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Grant set under which the statement first succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_grants: Option<GrantSet>,

    /// Grant set of the most recent attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tested_grants: Option<GrantSet>,

    /// The most recent attempt was denied for lack of privileges
    #[serde(default)]
    pub not_allowed: bool,

    /// The statement can never run; it is excluded from further testing
    #[serde(default)]
    pub invalid: bool,

    /// Resolved through the error policy's default outcome rather than a rule
    #[serde(default)]
    pub unclassified: bool,

    /// Error of the most recent attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ServerError>,
}

impl TestCase {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        let database = database.into();
        self.database = if database.is_empty() { None } else { Some(database) };
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.minimum_grants.is_some()
    }

    /// Record the verdict of an attempt made under `grants`.
    pub fn record(&mut self, grants: &GrantSet, verdict: Verdict) {
        self.last_tested_grants = Some(grants.clone());
        self.last_error = verdict.error;
        self.not_allowed = false;

        match verdict.outcome {
            Outcome::Allowed => {
                self.minimum_grants = Some(grants.clone());
                self.unclassified = verdict.unclassified;
            }
            Outcome::Denied => self.not_allowed = true,
            Outcome::Invalid => self.invalid = true,
        }
    }
}
