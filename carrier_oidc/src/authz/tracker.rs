use serde_json::{Map, Value};
use std::sync::Arc;

use crate::oidc::{FlowError, IdTokenClaims, StepUpOutcome, TokenBundle};
use crate::session::{AUTHZ_PREFIX, SessionStore};

use super::registry::{ContinuationRegistry, StepUpRequest};
use super::types::AuthorizationContext;

/// Per-session view of the pending step-up authorization.
///
/// At most one context is active per session. Continuations are looked up in
/// the shared [`ContinuationRegistry`].
#[derive(Clone)]
pub struct AuthorizationContextTracker {
    session: SessionStore,
    registry: Arc<ContinuationRegistry>,
}

impl AuthorizationContextTracker {
    pub fn new(session: SessionStore, registry: Arc<ContinuationRegistry>) -> Self {
        Self { session, registry }
    }

    pub async fn is_in_progress(&self) -> Result<bool, FlowError> {
        Ok(self.current().await?.is_some())
    }

    /// Start a step-up, replacing any context already pending on the session.
    pub async fn begin(
        &self,
        semantic_type: &str,
        context_message: &str,
        options: Map<String, Value>,
    ) -> Result<(), FlowError> {
        if !self.registry.contains(semantic_type) {
            tracing::error!("Step-up requested for unregistered type '{}'", semantic_type);
            return Err(FlowError::UnknownAuthorizationType(
                semantic_type.to_string(),
            ));
        }

        let context = AuthorizationContext::step_up(semantic_type, context_message, options);
        self.session
            .save_record(AUTHZ_PREFIX, &context, self.session.ttl())
            .await?;
        tracing::debug!("Began step-up authorization of type '{}'", semantic_type);
        Ok(())
    }

    pub async fn current(&self) -> Result<Option<AuthorizationContext>, FlowError> {
        Ok(self.session.load_record(AUTHZ_PREFIX).await?)
    }

    pub async fn end(&self) -> Result<(), FlowError> {
        Ok(self.session.remove_record(AUTHZ_PREFIX).await?)
    }

    /// Run the continuation registered for `context`.
    ///
    /// The authorization context and the flow state are cleared whether the
    /// continuation succeeds or not.
    pub async fn route_success(
        &self,
        context: &AuthorizationContext,
        resolved: &IdTokenClaims,
        tokens: &TokenBundle,
    ) -> Result<StepUpOutcome, FlowError> {
        let result = self.dispatch(context, resolved, tokens).await;

        if let Err(e) = self.end().await {
            tracing::error!("Failed to end authorization context: {}", e);
        }
        if let Err(e) = self.session.clear().await {
            tracing::error!("Failed to clear flow state after step-up: {}", e);
        }

        result
    }

    async fn dispatch(
        &self,
        context: &AuthorizationContext,
        resolved: &IdTokenClaims,
        tokens: &TokenBundle,
    ) -> Result<StepUpOutcome, FlowError> {
        let continuation = self.registry.get(context.semantic_type()).ok_or_else(|| {
            tracing::error!(
                "No continuation registered for step-up type '{}'",
                context.semantic_type()
            );
            FlowError::UnknownAuthorizationType(context.semantic_type().to_string())
        })?;

        let ambient = self.session.get_identity().await?;
        continuation.complete(&StepUpRequest {
            context,
            ambient: ambient.as_ref(),
            resolved,
            tokens,
        })
    }
}
