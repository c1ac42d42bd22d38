use thiserror::Error;

use crate::session::SessionError;
use crate::storage::StorageError;
use crate::utils::UtilError;

/// Typed failure of a flow phase.
///
/// Phases raise these and never decide cleanup themselves; the
/// [`FlowFilter`](crate::FlowFilter) maps them onto a cleanup scope.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("State mismatch: {0}")]
    StateMismatch(String),

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Authorization server returned '{error}': {}", .description.as_deref().unwrap_or("no description"))]
    Upstream {
        error: String,
        description: Option<String>,
    },

    #[error("Request to {endpoint} failed with status {status}")]
    UpstreamStatus { endpoint: String, status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Id token error: {0}")]
    IdToken(#[from] TokenVerificationError),

    #[error("Identity mismatch: {0}")]
    IdentityMismatch(String),

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("No continuation registered for authorization type '{0}'")]
    UnknownAuthorizationType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Http error: {0}")]
    Http(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Error from session operations
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

/// Coarse classification of a [`FlowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    StateMismatch,
    MissingInput,
    Upstream,
    IdTokenInvalid,
    IdentityMismatch,
    Configuration,
    Internal,
}

impl FlowError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::StateMismatch(_) => FailureCategory::StateMismatch,
            Self::MissingInput(_) | Self::NotAuthenticated(_) => FailureCategory::MissingInput,
            Self::Upstream { .. }
            | Self::UpstreamStatus { .. }
            | Self::MalformedResponse(_)
            | Self::Http(_) => FailureCategory::Upstream,
            Self::IdToken(_) => FailureCategory::IdTokenInvalid,
            Self::IdentityMismatch(_) => FailureCategory::IdentityMismatch,
            Self::UnknownAuthorizationType(_) | Self::Config(_) => FailureCategory::Configuration,
            Self::Storage(_) | Self::Session(_) | Self::Utils(_) => FailureCategory::Internal,
        }
    }
}

impl From<reqwest::Error> for FlowError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<StorageError> for FlowError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum TokenVerificationError {
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    #[error("Algorithm {0:?} is not accepted for id tokens")]
    DisallowedAlgorithm(jsonwebtoken::Algorithm),
    #[error("No matching key found in JWKS")]
    NoMatchingKey,
    #[error("Missing key component: {0}")]
    MissingKeyComponent(String),
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),
    #[error("Token not yet valid, now: {0}, iat: {1}")]
    TokenNotYetValidIssuedAt(i64, i64),
    #[error("Nonce missing from id token")]
    MissingNonce,
    #[error("Nonce mismatch")]
    NonceMismatch,
    #[error("JWKS fetch error: {0}")]
    JwksFetch(String),
    #[error("JWKS parsing error: {0}")]
    JwksParsing(String),
}
