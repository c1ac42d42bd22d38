mod config;
mod error;
mod handlers;
mod router;
mod session;
mod state;
mod step_up;

pub use config::{CARRIER_OIDC_REDIRECT_ANON, CARRIER_OIDC_REDIRECT_USER};
pub use error::IntoResponseError;
pub use router::{carrier_oidc_router, carrier_oidc_router_no_trace};
pub use session::{AuthRedirect, AuthUser};
pub use state::CarrierOidcState;
pub use step_up::begin_step_up;

// Re-export what applications need to build the state
pub use carrier_oidc::{
    CARRIER_OIDC_ROUTE_PREFIX, ContinuationRegistry, FlowConfig, TRANSACTION_TYPE,
    cache_store_from_env,
};
