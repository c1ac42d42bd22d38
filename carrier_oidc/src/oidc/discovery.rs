use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::FlowError;

/// OIDC provider configuration of the issuer serving one carrier.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IssuerMetadata {
    /// The issuer identifier for the OpenID Provider
    pub issuer: String,
    /// URL of the OAuth 2.0 Authorization Endpoint
    pub authorization_endpoint: String,
    /// URL of the OAuth 2.0 Token Endpoint
    pub token_endpoint: String,
    /// URL of the UserInfo Endpoint
    pub userinfo_endpoint: String,
    /// URL of the JSON Web Key Set
    pub jwks_uri: String,
    /// List of the OAuth 2.0 scope values supported
    pub scopes_supported: Option<Vec<String>>,
    /// List of the JWS signing algorithms supported for ID tokens
    pub id_token_signing_alg_values_supported: Option<Vec<String>>,
}

impl IssuerMetadata {
    fn validate(&self) -> Result<(), FlowError> {
        if self.issuer.trim().is_empty() {
            return Err(FlowError::MalformedResponse(
                "Issuer metadata has an empty issuer".to_string(),
            ));
        }
        for (name, value) in [
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
            ("userinfo_endpoint", &self.userinfo_endpoint),
            ("jwks_uri", &self.jwks_uri),
        ] {
            Url::parse(value).map_err(|e| {
                FlowError::MalformedResponse(format!("Issuer metadata {name} '{value}': {e}"))
            })?;
        }
        Ok(())
    }
}

/// Resolve the issuer for a carrier: GET `{discovery_url}?client_id=..&mccmnc=..`.
pub(crate) async fn fetch_issuer_metadata(
    client: &reqwest::Client,
    discovery_url: &str,
    client_id: &str,
    mccmnc: &str,
) -> Result<IssuerMetadata, FlowError> {
    tracing::debug!("Fetching issuer metadata for carrier {}", mccmnc);

    let response = client
        .get(discovery_url)
        .query(&[("client_id", client_id), ("mccmnc", mccmnc)])
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::error!("Issuer discovery failed with status: {}", response.status());
        return Err(FlowError::UpstreamStatus {
            endpoint: "issuer discovery".to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.text().await?;
    let metadata: IssuerMetadata = serde_json::from_str(&body)
        .map_err(|e| FlowError::MalformedResponse(format!("Issuer metadata: {e}")))?;
    metadata.validate()?;

    tracing::debug!("Issuer: {}", metadata.issuer);
    tracing::debug!("Authorization endpoint: {}", metadata.authorization_endpoint);
    tracing::debug!("Token endpoint: {}", metadata.token_endpoint);
    tracing::debug!("JWKS URI: {}", metadata.jwks_uri);

    Ok(metadata)
}
