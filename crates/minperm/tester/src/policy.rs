//! Declarative server error to outcome mapping.
//!
//! Which server errors mean "missing privilege" and which mean "the statement got
//! past the privilege checks" is data, not code: a policy is a list of rules, each
//! naming an error class, its outcome, and the error codes it covers. Policies are
//! keyed by server flavor and an optional minimum version so a configuration file
//! can carry one table per vendor/release line.

use crate::error::{TesterError, TesterResult};
use minperm_grants::{Flavor, ServerVersion};
use minperm_types::{Outcome, ServerError, Verdict};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One error class and the outcome it implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRule {
    /// Human-readable class name, e.g. `privilege_denied`
    pub class: String,

    /// Outcome for every code in this class
    pub outcome: Outcome,

    /// Server error numbers covered by this class
    pub codes: Vec<u16>,
}

impl ErrorRule {
    pub fn new(class: impl Into<String>, outcome: Outcome, codes: &[u16]) -> Self {
        Self {
            class: class.into(),
            outcome,
            codes: codes.to_vec(),
        }
    }
}

/// Error classification table for one server flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPolicy {
    /// Server flavor this table applies to
    pub flavor: Flavor,

    /// Lowest server version this table applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<Version>,

    /// Outcome for error codes no rule mentions
    #[serde(default = "default_outcome")]
    pub default_outcome: Outcome,

    /// Classification rules
    #[serde(default)]
    pub rules: Vec<ErrorRule>,
}

fn default_outcome() -> Outcome {
    Outcome::Allowed
}

impl ErrorPolicy {
    /// The built-in MySQL table.
    pub fn mysql() -> Self {
        Self {
            flavor: Flavor::MySql,
            min_version: None,
            default_outcome: Outcome::Allowed,
            rules: vec![
                // 1064: You have an error in your SQL syntax
                ErrorRule::new("syntax", Outcome::Invalid, &[1064]),
                // 1044: access denied to database
                // 1045: access denied for user (e.g. LOAD DATA INFILE)
                // 1095: not owner of thread (KILL)
                // 1142: command denied for table
                // 1143: command denied for column
                // 1227: you need (at least one of) the %s privilege(s)
                // 1419: no SUPER privilege and binary logging is enabled
                ErrorRule::new(
                    "privilege_denied",
                    Outcome::Denied,
                    &[1044, 1045, 1095, 1142, 1143, 1227, 1419],
                ),
                // 1049: unknown database
                // 1067: invalid default value
                // 1146: table doesn't exist
                // 1213: deadlock
                // 1215: cannot add foreign key constraint
                // 1231: invalid value for variable
                ErrorRule::new(
                    "environment",
                    Outcome::Allowed,
                    &[1049, 1067, 1146, 1213, 1215, 1231],
                ),
            ],
        }
    }

    /// The built-in MariaDB table. MariaDB keeps MySQL's numbers for these errors.
    pub fn mariadb() -> Self {
        Self {
            flavor: Flavor::MariaDb,
            ..Self::mysql()
        }
    }

    /// Built-in tables for every supported flavor.
    pub fn builtin() -> Vec<Self> {
        vec![Self::mysql(), Self::mariadb()]
    }

    /// Reject tables that map one code to two different outcomes.
    pub fn validate(&self) -> TesterResult<()> {
        let mut seen: HashMap<u16, (&str, Outcome)> = HashMap::new();
        for rule in &self.rules {
            for &code in &rule.codes {
                if let Some((class, outcome)) = seen.insert(code, (&rule.class, rule.outcome)) {
                    if outcome != rule.outcome {
                        return Err(TesterError::Policy(format!(
                            "error {} is both {} ({}) and {} ({})",
                            code, outcome, class, rule.outcome, rule.class
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// The rule covering `code`, if any.
    pub fn rule_for(&self, code: u16) -> Option<&ErrorRule> {
        self.rules.iter().find(|rule| rule.codes.contains(&code))
    }

    /// Classify a server error.
    pub fn verdict_for(&self, error: ServerError) -> Verdict {
        match self.rule_for(error.code) {
            Some(rule) => Verdict {
                outcome: rule.outcome,
                error: Some(error),
                unclassified: false,
            },
            None => Verdict {
                outcome: self.default_outcome,
                error: Some(error),
                unclassified: true,
            },
        }
    }

    fn applies_to(&self, server: &ServerVersion) -> bool {
        self.flavor == server.flavor()
            && self
                .min_version
                .as_ref()
                .map_or(true, |min| server.version() >= min)
    }

    /// Pick the most specific table for `server`: matching flavor, highest
    /// `min_version` not above the server's version.
    pub fn select<'a>(policies: &'a [ErrorPolicy], server: &ServerVersion) -> Option<&'a ErrorPolicy> {
        policies
            .iter()
            .filter(|policy| policy.applies_to(server))
            .max_by(|a, b| a.min_version.cmp(&b.min_version))
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::mysql()
    }
}
