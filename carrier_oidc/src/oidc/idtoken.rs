use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::storage::{CacheData, SharedCacheStore, StorageError};
use crate::utils::{base64url_decode, constant_time_eq};

use super::errors::TokenVerificationError;
use super::types::IdTokenClaims;

const JWKS_CACHE_PREFIX: &str = "jwks";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub(crate) struct Jwks {
    pub(crate) keys: Vec<Jwk>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub(crate) struct Jwk {
    pub(crate) kty: String,
    pub(crate) kid: Option<String>,
    pub(crate) alg: Option<String>,
    pub(crate) n: Option<String>,
    pub(crate) e: Option<String>,
    pub(crate) x: Option<String>,
    pub(crate) y: Option<String>,
    pub(crate) k: Option<String>,
}

/// What a valid ID token must assert for the current flow attempt.
pub(crate) struct IdTokenExpectations<'a> {
    pub(crate) issuer: &'a str,
    pub(crate) client_id: &'a str,
    pub(crate) nonce: &'a str,
    pub(crate) allowed_algorithms: &'a [Algorithm],
    pub(crate) clock_skew: Duration,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct JwksCache {
    jwks: Jwks,
    expires_at: DateTime<Utc>,
}

impl From<JwksCache> for CacheData {
    fn from(cache: JwksCache) -> Self {
        Self {
            value: serde_json::to_string(&cache).unwrap_or_default(),
        }
    }
}

impl TryFrom<CacheData> for JwksCache {
    type Error = TokenVerificationError;

    fn try_from(cache_data: CacheData) -> Result<Self, Self::Error> {
        serde_json::from_str(&cache_data.value)
            .map_err(|e| TokenVerificationError::JwksParsing(e.to_string()))
    }
}

async fn fetch_jwks_no_cache(
    client: &reqwest::Client,
    jwks_url: &str,
) -> Result<Jwks, TokenVerificationError> {
    let response = client
        .get(jwks_url)
        .send()
        .await
        .map_err(|e| TokenVerificationError::JwksFetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(TokenVerificationError::JwksFetch(format!(
            "status {}",
            response.status()
        )));
    }
    response
        .json::<Jwks>()
        .await
        .map_err(|e| TokenVerificationError::JwksParsing(e.to_string()))
}

async fn fetch_jwks_cache(
    client: &reqwest::Client,
    cache: &SharedCacheStore,
    jwks_url: &str,
    ttl: Duration,
    refresh: bool,
) -> Result<Jwks, TokenVerificationError> {
    let cache_err =
        |e: StorageError| TokenVerificationError::JwksFetch(format!("Cache error: {e}"));

    if !refresh {
        let cached = cache
            .lock()
            .await
            .get(JWKS_CACHE_PREFIX, jwks_url)
            .await
            .map_err(cache_err)?;
        if let Some(cached) = cached {
            let jwks_cache: JwksCache = cached.try_into()?;
            if jwks_cache.expires_at > Utc::now() {
                tracing::debug!("Returning valid cached JWKs");
                return Ok(jwks_cache.jwks);
            }
        }
    }

    let jwks = fetch_jwks_no_cache(client, jwks_url).await?;
    tracing::debug!("JWKs fetched from URL");

    let expires_at = Utc::now()
        + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(600));
    let jwks_cache = JwksCache {
        jwks: jwks.clone(),
        expires_at,
    };

    cache
        .lock()
        .await
        .put_with_ttl(
            JWKS_CACHE_PREFIX,
            jwks_url,
            jwks_cache.into(),
            ttl.as_secs() as usize,
        )
        .await
        .map_err(cache_err)?;

    Ok(jwks)
}

fn find_jwk<'a>(jwks: &'a Jwks, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => jwks.keys.iter().find(|key| key.kid.as_deref() == Some(kid)),
        None if jwks.keys.len() == 1 => jwks.keys.first(),
        None => None,
    }
}

fn component<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, TokenVerificationError> {
    value
        .as_deref()
        .ok_or_else(|| TokenVerificationError::MissingKeyComponent(name.to_string()))
}

pub(crate) fn decoding_key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, TokenVerificationError> {
    match jwk.kty.as_str() {
        "RSA" => Ok(DecodingKey::from_rsa_components(
            component(&jwk.n, "n")?,
            component(&jwk.e, "e")?,
        )?),
        "EC" => Ok(DecodingKey::from_ec_components(
            component(&jwk.x, "x")?,
            component(&jwk.y, "y")?,
        )?),
        "oct" => {
            let k = base64url_decode(component(&jwk.k, "k")?)
                .map_err(|e| TokenVerificationError::InvalidKeyEncoding(e.to_string()))?;
            Ok(DecodingKey::from_secret(&k))
        }
        kty => Err(TokenVerificationError::UnsupportedKeyType(kty.to_string())),
    }
}

/// Verify `token` against a key set already in hand.
pub(crate) fn verify_with_jwks(
    token: &str,
    jwks: &Jwks,
    expect: &IdTokenExpectations<'_>,
) -> Result<IdTokenClaims, TokenVerificationError> {
    let header = jsonwebtoken::decode_header(token)?;
    tracing::debug!("Algorithm from JWT header: {:?}", header.alg);

    if !expect.allowed_algorithms.contains(&header.alg) {
        return Err(TokenVerificationError::DisallowedAlgorithm(header.alg));
    }

    let jwk = find_jwk(jwks, header.kid.as_deref()).ok_or(TokenVerificationError::NoMatchingKey)?;
    if let Some(alg) = &jwk.alg {
        if Algorithm::from_str(alg).ok() != Some(header.alg) {
            return Err(TokenVerificationError::DisallowedAlgorithm(header.alg));
        }
    }
    let decoding_key = decoding_key_from_jwk(jwk)?;

    let mut validation = Validation::new(header.alg);
    validation.set_issuer(&[expect.issuer]);
    validation.set_audience(&[expect.client_id]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
    validation.leeway = expect.clock_skew.as_secs();
    validation.validate_nbf = true;

    let claims = jsonwebtoken::decode::<IdTokenClaims>(token, &decoding_key, &validation)?.claims;

    let now = Utc::now().timestamp();
    if claims.iat > now + expect.clock_skew.as_secs() as i64 {
        return Err(TokenVerificationError::TokenNotYetValidIssuedAt(now, claims.iat));
    }

    match claims.nonce.as_deref() {
        None => return Err(TokenVerificationError::MissingNonce),
        Some(nonce) if !constant_time_eq(nonce, expect.nonce) => {
            return Err(TokenVerificationError::NonceMismatch);
        }
        Some(_) => {}
    }

    Ok(claims)
}

/// Verify `token` against the issuer's key set at `jwks_url`, fetched through the cache.
///
/// A key id missing from a cached key set triggers one refetch so that
/// issuer key rotation does not fail logins until the cache expires.
pub(crate) async fn verify_id_token(
    client: &reqwest::Client,
    cache: &SharedCacheStore,
    jwks_url: &str,
    jwks_ttl: Duration,
    token: &str,
    expect: &IdTokenExpectations<'_>,
) -> Result<IdTokenClaims, TokenVerificationError> {
    let jwks = fetch_jwks_cache(client, cache, jwks_url, jwks_ttl, false).await?;
    match verify_with_jwks(token, &jwks, expect) {
        Err(TokenVerificationError::NoMatchingKey) => {
            tracing::debug!("Key not found in cached JWKs, refetching");
            let jwks = fetch_jwks_cache(client, cache, jwks_url, jwks_ttl, true).await?;
            verify_with_jwks(token, &jwks, expect)
        }
        result => result,
    }
}
