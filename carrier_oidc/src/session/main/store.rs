use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::oidc::AuthenticatedIdentity;
use crate::session::config::SESSION_COOKIE_MAX_AGE;
use crate::session::errors::SessionError;
use crate::session::types::StoredFlowState;
use crate::storage::{CacheData, SharedCacheStore};
use crate::utils::gen_random_string;

const FLOW_PREFIX: &str = "flow";
pub(crate) const AUTHZ_PREFIX: &str = "authz";
const IDENTITY_PREFIX: &str = "identity";

/// Typed accessor over the cache records of a single session.
///
/// Three independent records hang off the session id:
///
/// * `flow` - CSRF state, cached carrier and the per-attempt nonce / PKCE verifier
/// * `authz` - the pending step-up authorization context, managed by
///   [`AuthorizationContextTracker`](crate::AuthorizationContextTracker)
/// * `identity` - the ambient login established by a completed flow
///
/// Reads of unset values return `Ok(None)`. Errors are reserved for the
/// backing store failing.
#[derive(Clone)]
pub struct SessionStore {
    cache: SharedCacheStore,
    session_id: String,
    ttl: Duration,
}

impl SessionStore {
    /// `ttl` bounds how long flow and authorization records outlive an
    /// abandoned browser round trip.
    pub fn new(cache: SharedCacheStore, session_id: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            session_id: session_id.into(),
            ttl,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Handle on a freshly minted session id over the same cache and ttl.
    /// Nothing is copied; the new session starts empty.
    pub fn renew(&self) -> Result<Self, SessionError> {
        Ok(Self::new(
            self.cache.clone(),
            gen_random_string(32)?,
            self.ttl,
        ))
    }

    pub(crate) async fn load_record<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> Result<Option<T>, SessionError> {
        let data = self.cache.lock().await.get(prefix, &self.session_id).await?;
        match data {
            Some(data) => data.to_json().map(Some).map_err(|e| {
                tracing::error!("Failed to decode session record '{}': {}", prefix, e);
                SessionError::Corrupted(prefix.to_string())
            }),
            None => Ok(None),
        }
    }

    pub(crate) async fn save_record<T: Serialize>(
        &self,
        prefix: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let data = CacheData::from_json(value)?;
        self.cache
            .lock()
            .await
            .put_with_ttl(prefix, &self.session_id, data, ttl.as_secs() as usize)
            .await?;
        Ok(())
    }

    pub(crate) async fn remove_record(&self, prefix: &str) -> Result<(), SessionError> {
        self.cache
            .lock()
            .await
            .remove(prefix, &self.session_id)
            .await?;
        Ok(())
    }

    pub(crate) fn ttl(&self) -> Duration {
        self.ttl
    }

    pub(crate) async fn flow_state(&self) -> Result<StoredFlowState, SessionError> {
        Ok(self
            .load_record::<StoredFlowState>(FLOW_PREFIX)
            .await?
            .unwrap_or_default())
    }

    pub(crate) async fn save_flow_state(&self, state: &StoredFlowState) -> Result<(), SessionError> {
        self.save_record(FLOW_PREFIX, state, self.ttl).await
    }

    async fn update_flow_state(
        &self,
        update: impl FnOnce(&mut StoredFlowState),
    ) -> Result<(), SessionError> {
        let mut state = self.flow_state().await?;
        update(&mut state);
        self.save_flow_state(&state).await
    }

    /// Pending CSRF state token, if one has been issued and not yet consumed.
    pub async fn get_state(&self) -> Result<Option<String>, SessionError> {
        Ok(self.flow_state().await?.csrf_state)
    }

    pub async fn set_state(&self, token: &str) -> Result<(), SessionError> {
        self.update_flow_state(|s| s.csrf_state = Some(token.to_string()))
            .await
    }

    /// Carrier identifier (MCCMNC) remembered from an earlier hop of this session.
    pub async fn get_cached_carrier(&self) -> Result<Option<String>, SessionError> {
        Ok(self.flow_state().await?.cached_carrier)
    }

    pub async fn set_cached_carrier(&self, carrier_id: &str) -> Result<(), SessionError> {
        self.update_flow_state(|s| s.cached_carrier = Some(carrier_id.to_string()))
            .await
    }

    /// Remove the flow's security state. The authorization context and the
    /// ambient login are left untouched. Calling this on an empty session is a no-op.
    pub async fn clear(&self) -> Result<(), SessionError> {
        tracing::debug!("Clearing flow state for session");
        self.remove_record(FLOW_PREFIX).await
    }

    /// Identity of the user currently logged in on this session.
    pub async fn get_identity(&self) -> Result<Option<AuthenticatedIdentity>, SessionError> {
        self.load_record(IDENTITY_PREFIX).await
    }

    pub async fn set_identity(&self, identity: &AuthenticatedIdentity) -> Result<(), SessionError> {
        tracing::info!("Establishing login for subject {}", identity.subject());
        self.save_record(
            IDENTITY_PREFIX,
            identity,
            Duration::from_secs(*SESSION_COOKIE_MAX_AGE),
        )
        .await
    }

    pub async fn remove_identity(&self) -> Result<(), SessionError> {
        self.remove_record(IDENTITY_PREFIX).await
    }

    /// Drop everything bound to this session.
    pub async fn logout(&self) -> Result<(), SessionError> {
        tracing::info!("Logging out session");
        self.clear().await?;
        self.remove_record(AUTHZ_PREFIX).await?;
        self.remove_identity().await
    }
}
