//! Configuration for minperm

use crate::report::ReportConfig;
use minperm_search::SearchConfig;
use minperm_tester::mysql::ConnectionSettings;
use minperm_tester::ErrorPolicy;
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search limits and pruning behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Administrative connection and test accounts
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Report rendering
    #[serde(default)]
    pub report: ReportConfig,

    /// Error classification tables, one per server flavor/version line. A
    /// configured list replaces the built-in tables entirely.
    #[serde(default = "ErrorPolicy::builtin", skip_serializing)]
    pub policies: Vec<ErrorPolicy>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            connection: ConnectionSettings::default(),
            report: ReportConfig::default(),
            policies: ErrorPolicy::builtin(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    /// Load configuration: defaults, then `path` (if given), then `MINPERM__*`
    /// environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // MINPERM__SEARCH__MAX_DEPTH=4 sets search.max_depth
        builder = builder.add_source(
            config::Environment::with_prefix("MINPERM")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minperm_search::SingleGrantFailure;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search.max_depth, 10);
        assert_eq!(config.connection.principal_host, "%");
        assert_eq!(config.report.trim_query_size, 100);
        assert!(config.report.trim_long_queries);
        assert!(!config.report.show_invalid);
        assert_eq!(config.policies.len(), 2);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_defaults_round_trip() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.policies, ErrorPolicy::builtin());
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_load_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[search]\nmax_depth = 4\nsingle_grant_failure = \"skip-grant\"\n\n[report]\ntrim_query_size = 40"
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.search.max_depth, 4);
        assert_eq!(config.search.single_grant_failure, SingleGrantFailure::SkipGrant);
        assert_eq!(config.report.trim_query_size, 40);
        assert!(config.report.trim_long_queries);
    }

    #[test]
    fn test_configured_policies_replace_builtin() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[[policies]]\nflavor = \"mysql\"\ndefault_outcome = \"denied\"\n\n[[policies.rules]]\nclass = \"syntax\"\noutcome = \"invalid\"\ncodes = [1064]"
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.policies.len(), 1);
        assert_eq!(config.policies[0].default_outcome, minperm_types::Outcome::Denied);
        assert_eq!(config.policies[0].rules[0].codes, vec![1064]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load(Some("/nonexistent/minperm.toml")).is_err());
    }
}
