//! Privilege labels and ordered grant sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single privilege label, e.g. `SELECT` or `CREATE TEMPORARY TABLES`.
///
/// Labels are trimmed and upper-cased on construction; equality is by label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Grant(String);

impl Grant {
    pub fn new(label: impl AsRef<str>) -> Self {
        let normalized = label
            .as_ref()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the label can be interpolated into a `GRANT` statement as-is.
    ///
    /// Only ASCII letters, digits, underscores and single inner spaces are accepted.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == ' ')
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Grant {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Grant {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

/// An ordered, duplicate-free combination of grants tested as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantSet(Vec<Grant>);

impl GrantSet {
    /// Build a grant set, dropping repeated labels (first occurrence wins).
    pub fn new(grants: impl IntoIterator<Item = Grant>) -> Self {
        let mut unique: Vec<Grant> = Vec::new();
        for grant in grants {
            if !unique.contains(&grant) {
                unique.push(grant);
            }
        }
        Self(unique)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.0.iter()
    }

    pub fn contains(&self, grant: &Grant) -> bool {
        self.0.contains(grant)
    }

    pub fn as_slice(&self) -> &[Grant] {
        &self.0
    }

    /// Canonical rendering used to group results: labels joined by `", "`.
    pub fn canonical(&self) -> String {
        self.0
            .iter()
            .map(Grant::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for GrantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromIterator<Grant> for GrantSet {
    fn from_iter<I: IntoIterator<Item = Grant>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a GrantSet {
    type Item = &'a Grant;
    type IntoIter = std::slice::Iter<'a, Grant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
