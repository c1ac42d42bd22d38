mod client;
mod discovery;
mod engine;
mod errors;
mod idtoken;
mod request;
mod types;

pub use discovery::IssuerMetadata;
pub use engine::OidcFlowEngine;
pub use errors::{FailureCategory, FlowError, TokenVerificationError};
pub use types::{
    Audience, AuthenticatedIdentity, CallbackParams, FlowOutcome, IdTokenClaims, NameClaim, Phase,
    StepUpOutcome, TokenBundle, UserInfo, ValueClaim,
};

#[cfg(test)]
pub(crate) use types::test_identity;
