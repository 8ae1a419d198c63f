//! Server version parsing.

use crate::error::{GrantsError, GrantsResult};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server family, used to pick an error policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    MySql,
    MariaDb,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::MySql => "mysql",
            Flavor::MariaDb => "mariadb",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `SELECT VERSION()` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    raw: String,
    version: Version,
    flavor: Flavor,
}

impl ServerVersion {
    /// Parse strings such as `5.7.21-log`, `8.0.36-0ubuntu0.22.04.1` or
    /// `10.6.12-MariaDB`.
    ///
    /// Only the leading `major[.minor[.patch]]` digits are compared; missing
    /// components default to 0.
    pub fn parse(raw: &str) -> GrantsResult<Self> {
        let trimmed = raw.trim();
        let flavor = if trimmed.to_ascii_lowercase().contains("mariadb") {
            Flavor::MariaDb
        } else {
            Flavor::MySql
        };

        // MariaDB behind the replication protocol reports "5.5.5-<real version>"
        let numeric_source = match (flavor, trimmed.strip_prefix("5.5.5-")) {
            (Flavor::MariaDb, Some(rest)) => rest,
            _ => trimmed,
        };

        let leading: String = numeric_source
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        let mut parts = leading.split('.').filter(|p| !p.is_empty());
        let major = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(|| GrantsError::VersionParse(raw.to_string()))?;
        let minor = parts.next().and_then(|p| p.parse::<u64>().ok()).unwrap_or(0);
        let patch = parts.next().and_then(|p| p.parse::<u64>().ok()).unwrap_or(0);

        Ok(Self {
            raw: trimmed.to_string(),
            version: Version::new(major, minor, patch),
            flavor,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// `self >= major.minor.patch`
    pub fn at_least(&self, major: u64, minor: u64, patch: u64) -> bool {
        self.version >= Version::new(major, minor, patch)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.flavor)
    }
}
