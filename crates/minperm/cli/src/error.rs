//! CLI error types

use minperm_qreader::ReadError;
use minperm_search::SearchError;
use minperm_tester::TesterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every statement source came back empty
    #[error("No statements to test: use --test-statement, --input-file, --slow-log or --general-log")]
    NoStatements,

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Tester(#[from] TesterError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
