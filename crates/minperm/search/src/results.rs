//! Search results and grouping by resolving grant set.

use minperm_types::{Grant, GrantSet, TestCase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every testable statement was resolved
    AllResolved,
    /// The depth budget (or the universe) ran out with statements unresolved
    DepthExhausted,
    /// The cancellation flag was raised
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::AllResolved => f.write_str("all statements resolved"),
            StopReason::DepthExhausted => f.write_str("depth budget exhausted"),
            StopReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Final partition of the statements plus search bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub resolved: Vec<TestCase>,
    pub invalid: Vec<TestCase>,
    pub unresolved: Vec<TestCase>,

    /// Grants removed from the universe because they could not be provisioned
    pub pruned: Vec<Grant>,

    /// Combinations the driver tried to provision
    pub attempts: u64,

    /// Largest combination size entered
    pub depth_reached: usize,

    pub stop_reason: StopReason,
}

impl SearchReport {
    /// Resolved statements grouped by the grant set that resolved them.
    pub fn groups(&self) -> ResultGroups<'_> {
        ResultGroups::from_cases(&self.resolved)
    }

    /// Resolved statements whose error had no rule and fell back to the lenient
    /// default.
    pub fn unclassified(&self) -> impl Iterator<Item = &TestCase> {
        self.resolved.iter().filter(|case| case.unclassified)
    }

    pub fn total(&self) -> usize {
        self.resolved.len() + self.invalid.len() + self.unresolved.len()
    }
}

/// Statements that share one minimum grant set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultGroup<'a> {
    pub grants: &'a GrantSet,
    pub cases: Vec<&'a TestCase>,
}

impl ResultGroup<'_> {
    /// `SELECT, INSERT`-style rendering of the group's grants.
    pub fn label(&self) -> String {
        self.grants.canonical()
    }
}

/// Resolved statements grouped by canonical grant rendering, in order of first
/// appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultGroups<'a> {
    groups: Vec<ResultGroup<'a>>,
}

impl<'a> ResultGroups<'a> {
    pub fn from_cases(cases: &'a [TestCase]) -> Self {
        let mut groups: Vec<ResultGroup<'a>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for case in cases {
            let Some(grants) = case.minimum_grants.as_ref() else {
                continue;
            };
            let key = grants.canonical();
            match index.get(&key) {
                Some(&slot) => groups[slot].cases.push(case),
                None => {
                    index.insert(key, groups.len());
                    groups.push(ResultGroup {
                        grants,
                        cases: vec![case],
                    });
                }
            }
        }

        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultGroup<'a>> {
        self.groups.iter()
    }

    pub fn get(&self, label: &str) -> Option<&ResultGroup<'a>> {
        self.groups.iter().find(|group| group.label() == label)
    }
}
