//! Search configuration.

use crate::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};

/// What to do when a single grant cannot be provisioned at depth 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SingleGrantFailure {
    /// Prune the grant and abandon the rest of the current depth
    #[default]
    AbortDepth,
    /// Keep testing the remaining single grants; prune at the end of the depth
    SkipGrant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Exclusive upper bound on combination size
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default)]
    pub single_grant_failure: SingleGrantFailure,
}

fn default_max_depth() -> usize {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            single_grant_failure: SingleGrantFailure::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> SearchResult<()> {
        if self.max_depth < 2 {
            return Err(SearchError::Config(format!(
                "max_depth must be at least 2 (got {}); no combination size would be tested",
                self.max_depth
            )));
        }
        Ok(())
    }
}
