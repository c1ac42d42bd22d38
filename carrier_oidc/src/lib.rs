//! carrier_oidc - Carrier-brokered OpenID Connect relying party
//!
//! Resolves the user's mobile carrier (MCCMNC) through a discovery service,
//! discovers the carrier's issuer, runs the authorization code flow against it
//! and validates the resulting ID token. The same flow drives step-up
//! authorization of sensitive actions for an already logged-in user.

mod authz;
mod config;
mod coordination;
mod oidc;
mod session;
mod storage;
mod utils;

pub use authz::{
    AuthorizationContext, AuthorizationContextTracker, AuthorizationKind, ContinuationRegistry,
    StepUpContinuation, StepUpRequest, TRANSACTION_TYPE, TransactionContinuation,
};

pub use config::{CARRIER_OIDC_ROUTE_PREFIX, FlowConfig};

pub use coordination::{CoordinationError, FlowFilter};

pub use oidc::{
    Audience, AuthenticatedIdentity, CallbackParams, FailureCategory, FlowError, FlowOutcome,
    IdTokenClaims, IssuerMetadata, NameClaim, OidcFlowEngine, Phase, StepUpOutcome, TokenBundle,
    TokenVerificationError, UserInfo, ValueClaim,
};

pub use session::{
    SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME, SessionError, SessionLocks, SessionStore,
    get_session_id_from_headers, new_session_header, prepare_logout_response, session_cookie_header,
};

pub use storage::{
    CACHE_STORE_TYPE, CACHE_STORE_URL, CacheStore, InMemoryCacheStore, RedisCacheStore,
    SharedCacheStore, StorageError, cache_store_from_env, shared_cache_store,
};

pub use utils::{UtilError, gen_random_string};
