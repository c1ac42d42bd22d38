use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::oidc::{AuthenticatedIdentity, FlowError, IdTokenClaims, StepUpOutcome, TokenBundle};

use super::transaction::{TRANSACTION_TYPE, TransactionContinuation};
use super::types::AuthorizationContext;

/// Everything a continuation may look at when a step-up flow completes.
pub struct StepUpRequest<'a> {
    pub context: &'a AuthorizationContext,
    /// Identity already logged in on the session, if any.
    pub ambient: Option<&'a AuthenticatedIdentity>,
    /// Claims of the ID token the step-up flow just validated.
    pub resolved: &'a IdTokenClaims,
    pub tokens: &'a TokenBundle,
}

/// Application action run after a successful step-up of one semantic type.
///
/// Implementations must not touch session state; the tracker clears the
/// authorization context and flow state around the call.
pub trait StepUpContinuation: Send + Sync {
    fn complete(&self, request: &StepUpRequest<'_>) -> Result<StepUpOutcome, FlowError>;
}

impl<F> StepUpContinuation for F
where
    F: Fn(&StepUpRequest<'_>) -> Result<StepUpOutcome, FlowError> + Send + Sync,
{
    fn complete(&self, request: &StepUpRequest<'_>) -> Result<StepUpOutcome, FlowError> {
        self(request)
    }
}

/// Semantic type tag to continuation, matched exactly.
#[derive(Clone, Default)]
pub struct ContinuationRegistry {
    continuations: HashMap<String, Arc<dyn StepUpContinuation>>,
}

impl ContinuationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `transaction` continuation.
    pub fn with_builtin() -> Self {
        Self::new().register(TRANSACTION_TYPE, TransactionContinuation::default())
    }

    pub fn register(
        mut self,
        semantic_type: impl Into<String>,
        continuation: impl StepUpContinuation + 'static,
    ) -> Self {
        let semantic_type = semantic_type.into();
        tracing::debug!("Registering step-up continuation '{}'", semantic_type);
        self.continuations
            .insert(semantic_type, Arc::new(continuation));
        self
    }

    pub fn get(&self, semantic_type: &str) -> Option<Arc<dyn StepUpContinuation>> {
        self.continuations.get(semantic_type).cloned()
    }

    pub fn contains(&self, semantic_type: &str) -> bool {
        self.continuations.contains_key(semantic_type)
    }

    /// Startup check that every tag the application will begin is registered.
    pub fn ensure_registered(&self, semantic_types: &[&str]) -> Result<(), FlowError> {
        match semantic_types.iter().find(|t| !self.contains(t)) {
            Some(missing) => Err(FlowError::UnknownAuthorizationType(missing.to_string())),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ContinuationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.continuations.keys().collect();
        types.sort();
        f.debug_struct("ContinuationRegistry")
            .field("semantic_types", &types)
            .finish()
    }
}
