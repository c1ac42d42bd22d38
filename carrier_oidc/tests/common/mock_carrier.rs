//! Axum-based mock of a carrier's discovery service and OIDC issuer
//!
//! Each test gets its own server on a random port. Authorization codes are
//! registered by the test after it has read the authorization request the
//! relying party produced, standing in for the user's consent at the issuer.

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use jsonwebtoken::{EncodingKey, Header};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const KNOWN_CARRIER: &str = "311480";
pub const CLIENT_ID: &str = "client-1";
pub const CLIENT_SECRET: &str = "secret-1";
const SIGNING_KEY_ID: &str = "mock-key-1";
const SIGNING_SECRET: &[u8] = b"mock-carrier-hs256-signing-secret";

/// What the issuer asserts when a code is redeemed.
#[derive(Clone, Debug)]
pub struct CodeGrant {
    pub sub: String,
    pub nonce: String,
    pub code_challenge: String,
    /// Seconds relative to now for the `exp` claim.
    pub expires_in: i64,
    /// OAuth error returned by the token endpoint instead of tokens.
    pub token_error: Option<String>,
    /// Subject reported by userinfo when it should disagree with the token.
    pub userinfo_sub: Option<String>,
}

impl CodeGrant {
    pub fn new(sub: &str, nonce: &str, code_challenge: &str) -> Self {
        Self {
            sub: sub.to_string(),
            nonce: nonce.to_string(),
            code_challenge: code_challenge.to_string(),
            expires_in: 300,
            token_error: None,
            userinfo_sub: None,
        }
    }
}

#[derive(Default)]
struct MockState {
    codes: HashMap<String, CodeGrant>,
    access_tokens: HashMap<String, String>,
    token_requests: usize,
    jwks_requests: usize,
}

#[derive(Clone)]
pub struct MockCarrier {
    pub base_url: String,
    state: Arc<Mutex<MockState>>,
}

impl MockCarrier {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let carrier = Self {
            base_url,
            state: Arc::new(Mutex::new(MockState::default())),
        };

        let app = Router::new()
            .route("/issuer", get(issuer_metadata))
            .route("/jwks", get(jwks))
            .route("/token", post(token))
            .route("/userinfo", get(userinfo))
            .with_state(carrier.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        carrier
    }

    pub fn chooser_url(&self) -> String {
        format!("{}/chooser", self.base_url)
    }

    pub fn issuer_discovery_url(&self) -> String {
        format!("{}/issuer", self.base_url)
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.base_url)
    }

    pub fn issue_code(&self, code: &str, grant: CodeGrant) {
        self.state
            .lock()
            .unwrap()
            .codes
            .insert(code.to_string(), grant);
    }

    pub fn token_requests(&self) -> usize {
        self.state.lock().unwrap().token_requests
    }

    pub fn jwks_requests(&self) -> usize {
        self.state.lock().unwrap().jwks_requests
    }

    fn sign_id_token(&self, grant: &CodeGrant) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = json!({
            "iss": self.base_url,
            "sub": grant.sub,
            "aud": CLIENT_ID,
            "iat": now,
            "exp": now + grant.expires_in,
            "nonce": grant.nonce,
            "acr": "a3",
        });
        let mut header = Header::new(jsonwebtoken::Algorithm::HS256);
        header.kid = Some(SIGNING_KEY_ID.to_string());
        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(SIGNING_SECRET)).unwrap()
    }
}

#[derive(Deserialize)]
struct DiscoveryQuery {
    client_id: String,
    mccmnc: String,
}

async fn issuer_metadata(
    State(carrier): State<MockCarrier>,
    Query(query): Query<DiscoveryQuery>,
) -> Response {
    if query.client_id != CLIENT_ID || query.mccmnc != KNOWN_CARRIER {
        return StatusCode::NOT_FOUND.into_response();
    }
    let base = &carrier.base_url;
    Json(json!({
        "issuer": base,
        "authorization_endpoint": format!("{base}/authorize"),
        "token_endpoint": format!("{base}/token"),
        "userinfo_endpoint": format!("{base}/userinfo"),
        "jwks_uri": format!("{base}/jwks"),
        "scopes_supported": ["openid", "name", "email", "phone", "postal_code"],
        "id_token_signing_alg_values_supported": ["HS256"]
    }))
    .into_response()
}

async fn jwks(State(carrier): State<MockCarrier>) -> Json<Value> {
    carrier.state.lock().unwrap().jwks_requests += 1;
    Json(json!({
        "keys": [{
            "kty": "oct",
            "kid": SIGNING_KEY_ID,
            "alg": "HS256",
            "k": URL_SAFE_NO_PAD.encode(SIGNING_SECRET)
        }]
    }))
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    code: String,
    redirect_uri: String,
    code_verifier: String,
}

fn oauth_error(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(json!({"error": error, "error_description": format!("mock carrier: {error}")})),
    )
        .into_response()
}

async fn token(
    State(carrier): State<MockCarrier>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Response {
    let expected = format!(
        "Basic {}",
        STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}"))
    );
    if headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return oauth_error(StatusCode::UNAUTHORIZED, "invalid_client");
    }
    if form.grant_type != "authorization_code" || !form.redirect_uri.ends_with("/cb") {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_request");
    }

    let grant = {
        let mut state = carrier.state.lock().unwrap();
        state.token_requests += 1;
        state.codes.remove(&form.code)
    };
    let Some(grant) = grant else {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant");
    };
    if let Some(error) = &grant.token_error {
        return oauth_error(StatusCode::BAD_REQUEST, error);
    }

    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(form.code_verifier.as_bytes()));
    if challenge != grant.code_challenge {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant");
    }

    let access_token = uuid::Uuid::new_v4().to_string();
    let userinfo_sub = grant.userinfo_sub.clone().unwrap_or_else(|| grant.sub.clone());
    carrier
        .state
        .lock()
        .unwrap()
        .access_tokens
        .insert(access_token.clone(), userinfo_sub);

    Json(json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600,
        "id_token": carrier.sign_id_token(&grant)
    }))
    .into_response()
}

async fn userinfo(State(carrier): State<MockCarrier>, headers: HeaderMap) -> Response {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let sub = token.and_then(|t| carrier.state.lock().unwrap().access_tokens.get(t).cloned());
    match sub {
        Some(sub) => Json(json!({
            "sub": sub,
            "name": {"value": "Jane Doe", "given_name": "Jane", "family_name": "Doe"},
            "email": {"value": "jane@example.com"},
            "phone": {"value": "+15555550100"},
            "postal_code": {"value": "94105"}
        }))
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}
