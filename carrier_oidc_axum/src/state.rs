use http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

use carrier_oidc::{
    ContinuationRegistry, FlowConfig, FlowError, FlowFilter, OidcFlowEngine, SessionError,
    SessionStore, SharedCacheStore, get_session_id_from_headers,
};

/// Shared state of the carrier OIDC routes and extractors.
///
/// Applications either use it as their router state or expose it through
/// [`FromRef`](axum::extract::FromRef).
#[derive(Clone)]
pub struct CarrierOidcState {
    filter: Arc<FlowFilter>,
    cache: SharedCacheStore,
    session_ttl: Duration,
}

impl CarrierOidcState {
    /// `cache` backs both the sessions and the issuers' key sets.
    pub fn new(
        config: FlowConfig,
        cache: SharedCacheStore,
        registry: ContinuationRegistry,
    ) -> Result<Self, FlowError> {
        let session_ttl = config.session_ttl;
        let engine = OidcFlowEngine::new(config, cache.clone())?;
        let filter = FlowFilter::new(Arc::new(engine), Arc::new(registry));
        Ok(Self {
            filter: Arc::new(filter),
            cache,
            session_ttl,
        })
    }

    pub fn filter(&self) -> &FlowFilter {
        &self.filter
    }

    pub fn session(&self, session_id: &str) -> SessionStore {
        SessionStore::new(self.cache.clone(), session_id, self.session_ttl)
    }

    /// Session named by the request's session cookie, if it carries one.
    pub fn session_from_headers(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionStore>, SessionError> {
        Ok(get_session_id_from_headers(headers)?.map(|id| self.session(id)))
    }
}
