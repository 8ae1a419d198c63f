//! Errors reported by the database server and by principal sessions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error returned by the server for a statement it refused to run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("server error {code}: {message}")]
pub struct ServerError {
    /// Vendor error number (e.g. 1142 for a table access denial)
    pub code: u16,

    /// SQLSTATE, when the server sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_state: Option<String>,

    /// Server-provided message
    pub message: String,
}

impl ServerError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            sql_state: None,
            message: message.into(),
        }
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }
}

/// Failures while talking to the server through a principal's session.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The server answered with an error
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The session itself is gone (I/O, protocol, pool closed)
    #[error("session transport error: {0}")]
    Transport(String),
}
