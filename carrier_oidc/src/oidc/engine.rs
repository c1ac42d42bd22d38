use std::sync::Arc;

use crate::authz::AuthorizationContextTracker;
use crate::config::FlowConfig;
use crate::session::{SessionStore, StoredFlowState};
use crate::storage::SharedCacheStore;
use crate::utils::{constant_time_eq, gen_random_string, pkce_challenge};

use super::client::{TokenRequest, exchange_code_for_token, fetch_user_info, get_client};
use super::discovery::{IssuerMetadata, fetch_issuer_metadata};
use super::errors::FlowError;
use super::idtoken::{IdTokenExpectations, verify_id_token};
use super::request::{AuthorizationRequest, CarrierDiscoveryRequest, StepUpParams};
use super::types::{AuthenticatedIdentity, CallbackParams, FlowOutcome};

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;
const CODE_VERIFIER_LEN: usize = 32;

/// Phase handlers of the carrier-brokered authorization code flow.
///
/// Each handler either suspends with a redirect or resolves the flow. On
/// failure a handler returns a [`FlowError`] and leaves cleanup to the caller.
#[derive(Clone)]
pub struct OidcFlowEngine {
    config: Arc<FlowConfig>,
    http: reqwest::Client,
    cache: SharedCacheStore,
}

impl OidcFlowEngine {
    /// `cache` holds the issuers' key sets; it may be the same store that
    /// backs the sessions.
    pub fn new(config: FlowConfig, cache: SharedCacheStore) -> Result<Self, FlowError> {
        let http = get_client(config.http_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            http,
            cache,
        })
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Phase 0: send the browser to the carrier chooser with a fresh state.
    pub async fn start_discovery(&self, session: &SessionStore) -> Result<FlowOutcome, FlowError> {
        let state = gen_random_string(STATE_LEN)?;
        session.set_state(&state).await?;

        let request = CarrierDiscoveryRequest::new(
            &self.config.carrier_discovery_url,
            &self.config.client_id,
            &self.config.redirect_uri,
            &state,
        )?;
        tracing::debug!("Redirecting to carrier discovery");
        Ok(FlowOutcome::Redirect(request.to_url()))
    }

    /// Phase 1: the chooser returned a carrier. Resolve its issuer and send
    /// the browser to the issuer's authorization endpoint.
    pub async fn handle_discovery_return(
        &self,
        session: &SessionStore,
        tracker: &AuthorizationContextTracker,
        params: &CallbackParams,
    ) -> Result<FlowOutcome, FlowError> {
        let mccmnc = params
            .mccmnc
            .as_deref()
            .ok_or_else(|| FlowError::MissingInput("mccmnc".to_string()))?;
        self.verify_state(session, params.state.as_deref()).await?;

        let metadata = self.issuer_metadata(mccmnc).await?;
        let endpoint = AuthorizationRequest::parse_endpoint(&metadata.authorization_endpoint)?;

        let state = gen_random_string(STATE_LEN)?;
        let nonce = gen_random_string(NONCE_LEN)?;
        let code_verifier = gen_random_string(CODE_VERIFIER_LEN)?;
        session
            .save_flow_state(&StoredFlowState {
                csrf_state: Some(state.clone()),
                cached_carrier: Some(mccmnc.to_string()),
                nonce: Some(nonce.clone()),
                code_verifier: Some(code_verifier.clone()),
            })
            .await?;

        let (scope, step_up) = match tracker.current().await? {
            Some(context) => {
                tracing::info!(
                    "Requesting step-up authorization of type '{}'",
                    context.semantic_type()
                );
                (
                    "openid".to_string(),
                    Some(StepUpParams {
                        context: context.context_message().to_string(),
                        acr_values: self.config.step_up_acr_values.clone(),
                    }),
                )
            }
            None => (self.config.scope(), None),
        };

        let request = AuthorizationRequest {
            endpoint,
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            scope,
            state,
            nonce,
            code_challenge: pkce_challenge(&code_verifier),
            login_hint_token: params.login_hint_token.clone(),
            step_up,
        };
        tracing::debug!("Redirecting to authorization endpoint of carrier {}", mccmnc);
        Ok(FlowOutcome::Redirect(request.to_url()))
    }

    /// Phase 2: the issuer returned an authorization code.
    pub async fn handle_code_return(
        &self,
        session: &SessionStore,
        tracker: &AuthorizationContextTracker,
        params: &CallbackParams,
    ) -> Result<FlowOutcome, FlowError> {
        let code = params
            .code
            .as_deref()
            .ok_or_else(|| FlowError::MissingInput("code".to_string()))?;

        let stored = session.flow_state().await?;
        let mccmnc = params
            .mccmnc
            .clone()
            .or_else(|| stored.cached_carrier.clone())
            .ok_or_else(|| {
                FlowError::MissingInput("carrier id (mccmnc) not in callback or session".into())
            })?;

        let metadata = self.issuer_metadata(&mccmnc).await?;
        check_state(stored.csrf_state.as_deref(), params.state.as_deref())?;

        let nonce = stored
            .nonce
            .ok_or_else(|| FlowError::MissingInput("nonce for this attempt".to_string()))?;
        let code_verifier = stored
            .code_verifier
            .ok_or_else(|| FlowError::MissingInput("code verifier for this attempt".to_string()))?;

        let tokens = exchange_code_for_token(
            &self.http,
            &TokenRequest {
                token_endpoint: &metadata.token_endpoint,
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                redirect_uri: &self.config.redirect_uri,
                code,
                code_verifier: &code_verifier,
            },
        )
        .await?;
        session.clear().await?;

        let claims = verify_id_token(
            &self.http,
            &self.cache,
            &metadata.jwks_uri,
            self.config.jwks_cache_ttl,
            tokens.id_token(),
            &IdTokenExpectations {
                issuer: &metadata.issuer,
                client_id: &self.config.client_id,
                nonce: &nonce,
                allowed_algorithms: &self.config.id_token_algorithms,
                clock_skew: self.config.clock_skew,
            },
        )
        .await?;
        tracing::debug!("ID token verified for subject {}", claims.sub);

        if let Some(context) = tracker.current().await? {
            let outcome = tracker.route_success(&context, &claims, &tokens).await?;
            return Ok(FlowOutcome::StepUpCompleted(outcome));
        }

        let user_info =
            fetch_user_info(&self.http, &metadata.userinfo_endpoint, tokens.access_token()).await?;
        if user_info.sub != claims.sub {
            tracing::error!(
                "Userinfo subject {} does not match id token subject {}",
                user_info.sub,
                claims.sub
            );
            return Err(FlowError::MalformedResponse(
                "Userinfo subject does not match id token".to_string(),
            ));
        }

        tracing::info!("Carrier {} authenticated subject {}", mccmnc, claims.sub);
        Ok(FlowOutcome::Authenticated {
            identity: Box::new(AuthenticatedIdentity::new(claims.iss, user_info, tokens)),
            session_id: session.session_id().to_string(),
        })
    }

    /// Phase 3: the issuer or chooser reported an error.
    pub fn handle_error_return(&self, params: &CallbackParams) -> FlowError {
        let error = params.error.clone().unwrap_or_default();
        tracing::warn!(
            "Authorization failed upstream: {} ({})",
            error,
            params.error_description.as_deref().unwrap_or("-")
        );
        FlowError::Upstream {
            error,
            description: params.error_description.clone(),
        }
    }

    async fn verify_state(
        &self,
        session: &SessionStore,
        incoming: Option<&str>,
    ) -> Result<(), FlowError> {
        let stored = session.get_state().await?;
        check_state(stored.as_deref(), incoming)
    }

    async fn issuer_metadata(&self, mccmnc: &str) -> Result<IssuerMetadata, FlowError> {
        fetch_issuer_metadata(
            &self.http,
            &self.config.issuer_discovery_url,
            &self.config.client_id,
            mccmnc,
        )
        .await
    }
}

fn check_state(stored: Option<&str>, incoming: Option<&str>) -> Result<(), FlowError> {
    let incoming = incoming
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FlowError::StateMismatch("state parameter missing".to_string()))?;
    let stored = stored
        .ok_or_else(|| FlowError::StateMismatch("no state issued for this session".to_string()))?;
    if !constant_time_eq(stored, incoming) {
        tracing::warn!("State parameter does not match the session");
        return Err(FlowError::StateMismatch(
            "state parameter does not match".to_string(),
        ));
    }
    Ok(())
}
