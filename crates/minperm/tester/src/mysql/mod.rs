//! MySQL-backed provisioning and sessions (sqlx).

mod admin;
mod provisioner;
mod session;

pub use admin::{ConnectionSettings, MySqlAdmin, ScratchDatabase};
pub use provisioner::{MySqlPrincipal, MySqlProvisioner};
pub use session::MySqlSession;

use minperm_types::{ServerError, SessionError};
use sqlx::mysql::MySqlDatabaseError;

/// Extract the server error behind a sqlx error, if the server sent one.
pub(crate) fn server_error(err: &sqlx::Error) -> Option<ServerError> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    let mysql = db.try_downcast_ref::<MySqlDatabaseError>()?;
    let mut server = ServerError::new(mysql.number(), mysql.message());
    if let Some(state) = mysql.code() {
        server = server.with_sql_state(state);
    }
    Some(server)
}

pub(crate) fn session_error(err: sqlx::Error) -> SessionError {
    match server_error(&err) {
        Some(server) => SessionError::Server(server),
        None => SessionError::Transport(err.to_string()),
    }
}

/// Quote a string literal for account names and hosts.
pub(crate) fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Quote an identifier (database name).
pub(crate) fn quote_ident(value: &str) -> String {
    format!("`{}`", value.replace('`', "``"))
}

pub(crate) fn account(user: &str, host: &str) -> String {
    format!("{}@{}", quote_literal(user), quote_literal(host))
}
