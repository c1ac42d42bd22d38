mod config;
mod errors;
mod main;
mod types;

pub use config::{SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME};
pub use errors::SessionError;
pub use main::{
    SessionLocks, SessionStore, get_session_id_from_headers, new_session_header,
    prepare_logout_response, session_cookie_header,
};

pub(crate) use main::AUTHZ_PREFIX;
pub(crate) use types::StoredFlowState;
