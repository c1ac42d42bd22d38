//! Wiring of a flow filter against a [`MockCarrier`] and helpers that walk
//! the browser through the flow's redirects.

use carrier_oidc::{
    ContinuationRegistry, FlowConfig, FlowFilter, FlowOutcome, InMemoryCacheStore, OidcFlowEngine,
    SessionStore, SharedCacheStore, shared_cache_store,
};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use super::mock_carrier::{CLIENT_ID, CLIENT_SECRET, CodeGrant, KNOWN_CARRIER, MockCarrier};

pub struct TestFlow {
    pub carrier: MockCarrier,
    pub filter: FlowFilter,
    cache: SharedCacheStore,
    session: Mutex<SessionStore>,
}

impl TestFlow {
    pub async fn new() -> Self {
        let carrier = MockCarrier::start().await;
        let cache = shared_cache_store(InMemoryCacheStore::new());

        let mut config = FlowConfig::new(
            "https://rp.example",
            CLIENT_ID,
            CLIENT_SECRET,
            carrier.chooser_url(),
            carrier.issuer_discovery_url(),
        );
        config.id_token_algorithms = vec![Algorithm::HS256];
        config.http_timeout = Duration::from_secs(5);

        let engine = OidcFlowEngine::new(config, cache.clone()).unwrap();
        let filter = FlowFilter::new(
            Arc::new(engine),
            Arc::new(ContinuationRegistry::with_builtin()),
        );
        let session = SessionStore::new(
            cache.clone(),
            uuid::Uuid::new_v4().to_string(),
            Duration::from_secs(600),
        );

        Self {
            carrier,
            filter,
            cache,
            session: Mutex::new(session),
        }
    }

    /// The session the browser's cookie currently names.
    pub fn session(&self) -> SessionStore {
        self.session.lock().unwrap().clone()
    }

    /// Handle on any session id over the flow's cache.
    pub fn session_by_id(&self, session_id: &str) -> SessionStore {
        SessionStore::new(self.cache.clone(), session_id, Duration::from_secs(600))
    }

    /// Query string the browser would send to the callback. A completed
    /// login moves the browser onto the renewed session, as its cookie would.
    pub async fn callback(&self, query: &str) -> Result<FlowOutcome, carrier_oidc::CoordinationError> {
        let outcome = self.filter.handle(&self.session(), query).await?;
        if let FlowOutcome::Authenticated { session_id, .. } = &outcome {
            *self.session.lock().unwrap() = self.session_by_id(session_id);
        }
        Ok(outcome)
    }

    /// Phase 0: land on the callback with no parameters; returns the chooser's state.
    pub async fn start(&self) -> String {
        let outcome = self.callback("").await.unwrap();
        let query = redirect_query(&outcome);
        query["state"].clone()
    }

    /// Phases 0 and 1: pick the known carrier and follow the redirect to the
    /// issuer's authorization endpoint.
    pub async fn authorize(&self) -> HashMap<String, String> {
        let state = self.start().await;
        let outcome = self
            .callback(&format!("mccmnc={KNOWN_CARRIER}&state={state}"))
            .await
            .unwrap();
        let FlowOutcome::Redirect(url) = &outcome else {
            panic!("expected redirect to the issuer, got {outcome:?}");
        };
        assert!(url.starts_with(&self.carrier.authorize_url()));
        redirect_query(&outcome)
    }

    /// Consent at the issuer: register a code for `sub` bound to the request.
    pub fn consent(&self, code: &str, sub: &str, request: &HashMap<String, String>) -> CodeGrant {
        let grant = CodeGrant::new(sub, &request["nonce"], &request["code_challenge"]);
        self.carrier.issue_code(code, grant.clone());
        grant
    }
}

pub fn redirect_query(outcome: &FlowOutcome) -> HashMap<String, String> {
    let FlowOutcome::Redirect(url) = outcome else {
        panic!("expected redirect, got {outcome:?}");
    };
    Url::parse(url).unwrap().query_pairs().into_owned().collect()
}
