use super::session_error;
use crate::session::Session;
use async_trait::async_trait;
use minperm_types::SessionError;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use tracing::debug;

/// A dedicated connection opened as a test principal.
///
/// Statements go through the text protocol so that anything the server accepts
/// from a client (including statements it cannot prepare) is tested as written.
#[derive(Debug)]
pub struct MySqlSession {
    conn: Option<MySqlConnection>,
}

impl MySqlSession {
    pub(crate) fn new(conn: MySqlConnection) -> Self {
        Self { conn: Some(conn) }
    }

    fn conn(&mut self) -> Result<&mut MySqlConnection, SessionError> {
        self.conn
            .as_mut()
            .ok_or_else(|| SessionError::Transport("session closed".to_string()))
    }

    async fn run(&mut self, sql: &str) -> Result<(), SessionError> {
        let conn = self.conn()?;
        sqlx::Executor::execute(conn, sqlx::raw_sql(sql))
            .await
            .map(|_| ())
            .map_err(session_error)
    }

    /// Close the connection. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!(error = %e, "Error closing principal session");
            }
        }
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn begin(&mut self) -> Result<(), SessionError> {
        self.run("START TRANSACTION").await
    }

    async fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        self.run(sql).await
    }

    async fn rollback(&mut self) -> Result<(), SessionError> {
        self.run("ROLLBACK").await
    }
}
