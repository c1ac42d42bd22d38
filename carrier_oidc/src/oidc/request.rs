use url::Url;

use super::errors::FlowError;

fn parse_endpoint(endpoint: &str, what: &str) -> Result<Url, FlowError> {
    Url::parse(endpoint).map_err(|e| FlowError::Config(format!("Invalid {what} '{endpoint}': {e}")))
}

/// Redirect to the carrier chooser that resolves the user's MCCMNC.
#[derive(Debug, Clone)]
pub(crate) struct CarrierDiscoveryRequest {
    endpoint: Url,
    client_id: String,
    redirect_uri: String,
    state: String,
}

impl CarrierDiscoveryRequest {
    pub(crate) fn new(
        endpoint: &str,
        client_id: &str,
        redirect_uri: &str,
        state: &str,
    ) -> Result<Self, FlowError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint, "carrier discovery URL")?,
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            state: state.to_string(),
        })
    }

    pub(crate) fn to_url(&self) -> String {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("state", &self.state);
        url.into()
    }
}

/// Custom parameters sent only when re-authorizing a logged-in user.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StepUpParams {
    pub(crate) context: String,
    pub(crate) acr_values: String,
}

/// Authorization-code request to the carrier's issuer.
#[derive(Debug, Clone)]
pub(crate) struct AuthorizationRequest {
    pub(crate) endpoint: Url,
    pub(crate) client_id: String,
    pub(crate) redirect_uri: String,
    pub(crate) scope: String,
    pub(crate) state: String,
    pub(crate) nonce: String,
    pub(crate) code_challenge: String,
    pub(crate) login_hint_token: Option<String>,
    pub(crate) step_up: Option<StepUpParams>,
}

impl AuthorizationRequest {
    pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, FlowError> {
        Url::parse(endpoint).map_err(|e| {
            FlowError::MalformedResponse(format!("Invalid authorization endpoint '{endpoint}': {e}"))
        })
    }

    pub(crate) fn to_url(&self) -> String {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &self.scope)
                .append_pair("state", &self.state)
                .append_pair("nonce", &self.nonce)
                .append_pair("code_challenge", &self.code_challenge)
                .append_pair("code_challenge_method", "S256");
            if let Some(hint) = &self.login_hint_token {
                query.append_pair("login_hint_token", hint);
            }
            if let Some(step_up) = &self.step_up {
                query
                    .append_pair("context", &step_up.context)
                    .append_pair("acr_values", &step_up.acr_values);
            }
        }
        url.into()
    }
}
