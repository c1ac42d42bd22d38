//! Central configuration for the carrier_oidc crate

use jsonwebtoken::Algorithm;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::oidc::FlowError;

/// Route prefix under which the flow endpoints are mounted.
///
/// The redirect URI registered with the carrier is `{BASE_URL}{prefix}/cb`.
/// Default: "/auth"
pub static CARRIER_OIDC_ROUTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("CARRIER_OIDC_ROUTE_PREFIX").unwrap_or_else(|_| "/auth".to_string())
});

const DEFAULT_SCOPES: &[&str] = &["openid", "name", "email", "phone", "postal_code"];
const DEFAULT_STEP_UP_ACR_VALUES: &str = "a3";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CLOCK_SKEW_SECS: u64 = 60;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_FLOW_SESSION_TTL_SECS: u64 = 600;

/// Relying-party settings for the carrier-brokered flow.
#[derive(Clone)]
pub struct FlowConfig {
    pub base_url: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub carrier_discovery_url: String,
    pub issuer_discovery_url: String,
    /// Scopes requested by a login flow. Step-up flows request `openid` only.
    pub scopes: Vec<String>,
    pub step_up_acr_values: String,
    pub http_timeout: Duration,
    pub clock_skew: Duration,
    pub id_token_algorithms: Vec<Algorithm>,
    pub jwks_cache_ttl: Duration,
    /// Lifetime of flow and step-up records for an abandoned attempt.
    pub session_ttl: Duration,
}

impl FlowConfig {
    /// Settings with defaults for everything but the client registration and discovery endpoints.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        carrier_discovery_url: impl Into<String>,
        issuer_discovery_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let redirect_uri = format!("{}{}/cb", base_url, CARRIER_OIDC_ROUTE_PREFIX.as_str());
        Self {
            base_url,
            redirect_uri,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            carrier_discovery_url: carrier_discovery_url.into(),
            issuer_discovery_url: issuer_discovery_url.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            step_up_acr_values: DEFAULT_STEP_UP_ACR_VALUES.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            clock_skew: Duration::from_secs(DEFAULT_CLOCK_SKEW_SECS),
            id_token_algorithms: vec![Algorithm::RS256],
            jwks_cache_ttl: Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS),
            session_ttl: Duration::from_secs(DEFAULT_FLOW_SESSION_TTL_SECS),
        }
    }

    /// Read settings from the process environment.
    ///
    /// Required: `BASE_URL`, `CLIENT_ID`, `CLIENT_SECRET`, `CARRIER_DISCOVERY_URL`,
    /// `OIDC_PROVIDER_CONFIG_URL`. Everything else falls back to its default.
    pub fn from_env() -> Result<Self, FlowError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FlowError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| FlowError::Config(format!("{name} must be set")))
        };
        let seconds = |name: &str, default: u64| -> Result<Duration, FlowError> {
            match lookup(name) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| FlowError::Config(format!("{name} must be a number of seconds"))),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let mut config = Self::new(
            required("BASE_URL")?,
            required("CLIENT_ID")?,
            required("CLIENT_SECRET")?,
            required("CARRIER_DISCOVERY_URL")?,
            required("OIDC_PROVIDER_CONFIG_URL")?,
        );

        if let Some(scope) = lookup("OIDC_SCOPE") {
            config.scopes = scope.split_whitespace().map(str::to_string).collect();
            if !config.scopes.iter().any(|s| s == "openid") {
                return Err(FlowError::Config(
                    "OIDC_SCOPE must include 'openid'".to_string(),
                ));
            }
        }
        if let Some(acr) = lookup("OIDC_STEP_UP_ACR_VALUES") {
            config.step_up_acr_values = acr;
        }
        if let Some(algs) = lookup("OIDC_ID_TOKEN_ALGS") {
            config.id_token_algorithms = parse_algorithms(&algs)?;
        }
        config.http_timeout = seconds("OIDC_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        config.clock_skew = seconds("OIDC_CLOCK_SKEW_SECS", DEFAULT_CLOCK_SKEW_SECS)?;
        config.jwks_cache_ttl =
            seconds("OIDC_JWKS_CACHE_TTL_SECS", DEFAULT_JWKS_CACHE_TTL_SECS)?;
        config.session_ttl = seconds("FLOW_SESSION_TTL_SECS", DEFAULT_FLOW_SESSION_TTL_SECS)?;

        Ok(config)
    }

    /// Space-separated scope string for a login authorization request.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, FlowError> {
    let algs = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            Algorithm::from_str(s)
                .map_err(|_| FlowError::Config(format!("Unknown id token algorithm: {s}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if algs.is_empty() {
        return Err(FlowError::Config(
            "OIDC_ID_TOKEN_ALGS must name at least one algorithm".to_string(),
        ));
    }
    Ok(algs)
}

impl fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowConfig")
            .field("base_url", &self.base_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("carrier_discovery_url", &self.carrier_discovery_url)
            .field("issuer_discovery_url", &self.issuer_discovery_url)
            .field("scopes", &self.scopes)
            .field("step_up_acr_values", &self.step_up_acr_values)
            .field("http_timeout", &self.http_timeout)
            .field("clock_skew", &self.clock_skew)
            .field("id_token_algorithms", &self.id_token_algorithms)
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}
