//! Statement classification under one principal.

use crate::policy::ErrorPolicy;
use crate::provision::Principal;
use crate::session::Session;
use minperm_types::{Outcome, SessionError, TestCase, Verdict};
use tracing::{debug, warn};

/// Runs statements inside a rolled-back transaction and classifies the result with
/// an [`ErrorPolicy`].
///
/// The rollback is unconditional. Statements that commit implicitly on the server
/// (DDL on MySQL) still take effect, which is why they are tested against a scratch
/// database.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    policy: ErrorPolicy,
}

impl Classifier {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ErrorPolicy {
        &self.policy
    }

    /// Execute `case` under `principal`, record the verdict on the case and return
    /// its outcome.
    ///
    /// Server errors never escape: they become outcomes. Only transport failures
    /// (the session is gone) are returned as errors.
    pub async fn classify<P: Principal>(
        &self,
        principal: &mut P,
        case: &mut TestCase,
    ) -> Result<Outcome, SessionError> {
        let grants = principal.grants().clone();

        let verdict = match principal.session() {
            Ok(session) => self.run_rolled_back(session, &case.query).await?,
            Err(refusal) => {
                debug!(user = principal.user(), error = %refusal, "Session refused; classifying from refusal");
                self.policy.verdict_for(refusal)
            }
        };

        let outcome = verdict.outcome;
        debug!(
            grants = %grants,
            outcome = %outcome,
            code = verdict.error.as_ref().map(|e| e.code),
            query = %case.query,
            "Classified statement"
        );
        case.record(&grants, verdict);
        Ok(outcome)
    }

    async fn run_rolled_back<S: Session>(
        &self,
        session: &mut S,
        sql: &str,
    ) -> Result<Verdict, SessionError> {
        match session.begin().await {
            Ok(()) => {}
            Err(SessionError::Server(err)) => return Ok(self.policy.verdict_for(err)),
            Err(transport) => return Err(transport),
        }

        let executed = session.execute(sql).await;
        let rolled_back = session.rollback().await;

        let verdict = match executed {
            Ok(()) => Verdict::success(),
            Err(SessionError::Server(err)) => self.policy.verdict_for(err),
            Err(transport) => return Err(transport),
        };

        match rolled_back {
            Ok(()) => {}
            Err(SessionError::Server(err)) => {
                warn!(error = %err, "Rollback refused by server");
            }
            Err(transport) => return Err(transport),
        }

        Ok(verdict)
    }
}
