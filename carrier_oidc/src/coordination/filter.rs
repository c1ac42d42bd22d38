use serde_json::{Map, Value};
use std::sync::Arc;

use crate::authz::{AuthorizationContextTracker, ContinuationRegistry};
use crate::oidc::{
    AuthenticatedIdentity, CallbackParams, FlowError, FlowOutcome, OidcFlowEngine, Phase,
};
use crate::session::{SessionLocks, SessionStore};

use super::errors::CoordinationError;

/// Request entry point of the flow.
///
/// Requests for the same session are serialized. Any failure wipes the
/// session's flow state so the next attempt starts over from carrier
/// discovery; a failed step-up additionally ends the authorization context.
#[derive(Clone)]
pub struct FlowFilter {
    engine: Arc<OidcFlowEngine>,
    registry: Arc<ContinuationRegistry>,
    locks: SessionLocks,
}

impl FlowFilter {
    pub fn new(engine: Arc<OidcFlowEngine>, registry: Arc<ContinuationRegistry>) -> Self {
        Self {
            engine,
            registry,
            locks: SessionLocks::new(),
        }
    }

    pub fn engine(&self) -> &OidcFlowEngine {
        &self.engine
    }

    pub fn registry(&self) -> &ContinuationRegistry {
        &self.registry
    }

    /// Step-up tracker bound to `session`.
    pub fn tracker(&self, session: &SessionStore) -> AuthorizationContextTracker {
        AuthorizationContextTracker::new(session.clone(), self.registry.clone())
    }

    /// Record a step-up for the logged-in user of `session`, replacing any
    /// pending one. Waits for a phase already running on the session.
    pub async fn begin_step_up(
        &self,
        session: &SessionStore,
        semantic_type: &str,
        context_message: &str,
        options: Map<String, Value>,
    ) -> Result<(), FlowError> {
        let _guard = self.locks.acquire(session.session_id()).await;
        self.tracker(session)
            .begin(semantic_type, context_message, options)
            .await
    }

    /// Run the phase selected by the callback's raw query string.
    ///
    /// A completed login is stored under a freshly minted session id, which
    /// the outcome names; the pre-login session is dropped.
    pub async fn handle(
        &self,
        session: &SessionStore,
        query: &str,
    ) -> Result<FlowOutcome, CoordinationError> {
        let _guard = self.locks.acquire(session.session_id()).await;

        let params = CallbackParams::from_query(query);
        let tracker = self.tracker(session);

        let step_up = match tracker.is_in_progress().await {
            Ok(step_up) => step_up,
            Err(e) => return Err(self.fail(session, &tracker, false, e).await),
        };

        match self.dispatch(session, &tracker, &params).await {
            Ok(FlowOutcome::Authenticated { identity, .. }) => {
                match self.establish_login(session, &identity).await {
                    Ok(session_id) => Ok(FlowOutcome::Authenticated {
                        identity,
                        session_id,
                    }),
                    Err(e) => Err(self.fail(session, &tracker, step_up, e).await),
                }
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(self.fail(session, &tracker, step_up, e).await),
        }
    }

    /// Move a completed login onto a new session id and drop the old session.
    async fn establish_login(
        &self,
        session: &SessionStore,
        identity: &AuthenticatedIdentity,
    ) -> Result<String, FlowError> {
        let renewed = session.renew()?;
        renewed.set_identity(identity).await?;
        session.logout().await?;
        tracing::debug!("Renewed session id after login");
        Ok(renewed.session_id().to_string())
    }

    async fn dispatch(
        &self,
        session: &SessionStore,
        tracker: &AuthorizationContextTracker,
        params: &CallbackParams,
    ) -> Result<FlowOutcome, FlowError> {
        let phase = params.phase();
        tracing::debug!("Dispatching flow phase {:?}", phase);
        match phase {
            Phase::ErrorReturn => Err(self.engine.handle_error_return(params)),
            Phase::CodeReturn => self.engine.handle_code_return(session, tracker, params).await,
            Phase::DiscoveryReturn => {
                self.engine
                    .handle_discovery_return(session, tracker, params)
                    .await
            }
            Phase::DiscoveryStart => self.engine.start_discovery(session).await,
        }
    }

    async fn fail(
        &self,
        session: &SessionStore,
        tracker: &AuthorizationContextTracker,
        step_up: bool,
        error: FlowError,
    ) -> CoordinationError {
        if let Err(e) = session.clear().await {
            tracing::error!("Failed to clear flow state after failure: {}", e);
        }
        if step_up {
            if let Err(e) = tracker.end().await {
                tracing::error!("Failed to end authorization context after failure: {}", e);
            }
            CoordinationError::StepUp(error).log()
        } else {
            CoordinationError::Authentication(error).log()
        }
    }
}
