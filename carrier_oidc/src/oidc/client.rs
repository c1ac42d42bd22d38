use serde::Deserialize;
use std::time::Duration;

use super::errors::FlowError;
use super::types::{TokenBundle, UserInfo};

/// HTTP client for issuer discovery, token, userinfo and key-set requests.
///
/// `timeout` bounds every upstream call made while handling a request.
pub(crate) fn get_client(timeout: Duration) -> Result<reqwest::Client, FlowError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| FlowError::Config(format!("Failed to create HTTP client: {e}")))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

pub(crate) struct TokenRequest<'a> {
    pub(crate) token_endpoint: &'a str,
    pub(crate) client_id: &'a str,
    pub(crate) client_secret: &'a str,
    pub(crate) redirect_uri: &'a str,
    pub(crate) code: &'a str,
    pub(crate) code_verifier: &'a str,
}

/// Authorization-code grant with client_secret_basic authentication.
pub(crate) async fn exchange_code_for_token(
    client: &reqwest::Client,
    request: &TokenRequest<'_>,
) -> Result<TokenBundle, FlowError> {
    let response = client
        .post(request.token_endpoint)
        .basic_auth(request.client_id, Some(request.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", request.code),
            ("redirect_uri", request.redirect_uri),
            ("code_verifier", request.code_verifier),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::debug!("Token exchange failed with status {}", status);
        return Err(match serde_json::from_str::<OAuthErrorResponse>(&body) {
            Ok(err) => FlowError::Upstream {
                error: err.error,
                description: err.error_description,
            },
            Err(_) => FlowError::UpstreamStatus {
                endpoint: "token".to_string(),
                status: status.as_u16(),
            },
        });
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| FlowError::MalformedResponse(format!("Token response: {e}")))?;
    let id_token = token.id_token.ok_or_else(|| {
        FlowError::MalformedResponse("ID token not present in token response".to_string())
    })?;

    tracing::debug!("Token exchange succeeded");
    Ok(TokenBundle::new(
        token.access_token,
        id_token,
        token.refresh_token,
    ))
}

/// Bearer-authenticated GET of the userinfo endpoint.
pub(crate) async fn fetch_user_info(
    client: &reqwest::Client,
    userinfo_endpoint: &str,
    access_token: &str,
) -> Result<UserInfo, FlowError> {
    let response = client
        .get(userinfo_endpoint)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FlowError::UpstreamStatus {
            endpoint: "userinfo".to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.text().await?;
    let user_info: UserInfo = serde_json::from_str(&body)
        .map_err(|e| FlowError::MalformedResponse(format!("Userinfo response: {e}")))?;

    tracing::debug!("User info fetched for subject {}", user_info.sub);
    Ok(user_info)
}
