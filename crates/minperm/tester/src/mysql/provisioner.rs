use super::session::MySqlSession;
use super::{account, quote_literal, server_error};
use crate::error::ProvisionError;
use crate::provision::{Principal, Provisioner};
use async_trait::async_trait;
use minperm_types::{GrantSet, ServerError};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool};
use sqlx::Connection;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const USER_PREFIX: &str = "minperm_";

/// Creates one throwaway MySQL account per grant combination.
#[derive(Debug, Clone)]
pub struct MySqlProvisioner {
    admin: MySqlPool,
    /// Connect options for principal sessions (scratch database selected)
    session_options: MySqlConnectOptions,
    host: String,
}

impl MySqlProvisioner {
    pub fn new(admin: MySqlPool, session_options: MySqlConnectOptions, host: impl Into<String>) -> Self {
        Self {
            admin,
            session_options,
            host: host.into(),
        }
    }

    async fn admin_exec(&self, sql: &str) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(sql).execute(&self.admin).await.map(|_| ())
    }

    async fn drop_user(&self, user: &str) -> Result<(), ProvisionError> {
        let sql = format!("DROP USER IF EXISTS {}", account(user, &self.host));
        self.admin_exec(&sql)
            .await
            .map_err(|e| ProvisionError::Cleanup {
                user: user.to_string(),
                reason: e.to_string(),
            })
    }

    /// Drop a half-created account; the original failure is what gets reported.
    async fn discard(&self, user: &str) {
        if let Err(e) = self.drop_user(user).await {
            warn!(user, error = %e, "Failed to drop partially created account");
        }
    }

    async fn open_session(
        &self,
        user: &str,
        password: &str,
    ) -> Result<Result<MySqlSession, ServerError>, sqlx::Error> {
        let options = self
            .session_options
            .clone()
            .username(user)
            .password(password);

        match MySqlConnection::connect_with(&options).await {
            Ok(conn) => Ok(Ok(MySqlSession::new(conn))),
            Err(e) => match server_error(&e) {
                Some(refusal) => Ok(Err(refusal)),
                None => Err(e),
            },
        }
    }
}

#[async_trait]
impl Provisioner for MySqlProvisioner {
    type Principal = MySqlPrincipal;

    #[instrument(skip_all, fields(grants = %grants))]
    async fn create(&self, grants: &GrantSet) -> Result<MySqlPrincipal, ProvisionError> {
        if let Some(bad) = grants.iter().find(|g| !g.is_well_formed()) {
            return Err(ProvisionError::InvalidGrant(bad.clone()));
        }

        let user = generate_user();
        let password = generate_password();
        let target = account(&user, &self.host);

        self.admin_exec(&format!("DROP USER IF EXISTS {target}"))
            .await
            .map_err(|e| provision_failure(e, ProvisionError::Account))?;

        self.admin_exec(&format!(
            "CREATE USER {target} IDENTIFIED BY {}",
            quote_literal(&password)
        ))
        .await
        .map_err(|e| provision_failure(e, ProvisionError::Account))?;

        let grant_sql = format!("GRANT {} ON *.* TO {target}", grants.canonical());
        if let Err(e) = self.admin_exec(&grant_sql).await {
            self.discard(&user).await;
            return Err(provision_failure(e, |source| ProvisionError::Rejected {
                grants: grants.clone(),
                source,
            }));
        }

        let session = match self.open_session(&user, &password).await {
            Ok(session) => session,
            Err(e) => {
                self.discard(&user).await;
                return Err(ProvisionError::Connection(e.to_string()));
            }
        };

        if let Err(refusal) = &session {
            debug!(user, error = %refusal, "Principal created but session refused");
        } else {
            debug!(user, "Principal created");
        }

        Ok(MySqlPrincipal {
            user,
            host: self.host.clone(),
            grants: grants.clone(),
            session,
            admin: self.admin.clone(),
            released: false,
        })
    }

    #[instrument(skip_all, fields(user = %principal.user))]
    async fn destroy(&self, mut principal: MySqlPrincipal) -> Result<(), ProvisionError> {
        if principal.released {
            return Ok(());
        }
        if let Ok(session) = principal.session.as_mut() {
            session.close().await;
        }
        let result = self.drop_user(&principal.user).await;
        principal.released = true;
        if result.is_ok() {
            debug!("Principal destroyed");
        }
        result
    }
}

/// Server errors map to `server_failure`; anything else means the administrative
/// connection is unusable.
fn provision_failure(
    err: sqlx::Error,
    server_failure: impl FnOnce(ServerError) -> ProvisionError,
) -> ProvisionError {
    match server_error(&err) {
        Some(server) => server_failure(server),
        None => ProvisionError::Connection(err.to_string()),
    }
}

fn generate_user() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{USER_PREFIX}{}", &id[..12])
}

fn generate_password() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();
    // Passes validate_password at MEDIUM strength.
    format!("Mp{body}#9")
}

/// A live test account. Hand it back to [`MySqlProvisioner::destroy`]; if it is
/// dropped instead, the account is dropped in the background.
#[derive(Debug)]
pub struct MySqlPrincipal {
    user: String,
    host: String,
    grants: GrantSet,
    session: Result<MySqlSession, ServerError>,
    admin: MySqlPool,
    released: bool,
}

impl Principal for MySqlPrincipal {
    type Session = MySqlSession;

    fn user(&self) -> &str {
        &self.user
    }

    fn grants(&self) -> &GrantSet {
        &self.grants
    }

    fn session(&mut self) -> Result<&mut MySqlSession, ServerError> {
        self.session.as_mut().map_err(|refusal| refusal.clone())
    }
}

impl Drop for MySqlPrincipal {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(user = %self.user, "No runtime to drop test account; it must be removed by hand");
            return;
        };
        let sql = format!("DROP USER IF EXISTS {}", account(&self.user, &self.host));
        let admin = self.admin.clone();
        let user = self.user.clone();
        handle.spawn(async move {
            if let Err(e) = sqlx::raw_sql(&sql).execute(&admin).await {
                warn!(user, error = %e, "Background drop of test account failed");
            }
        });
    }
}
