mod cookie;
mod lock;
mod store;

pub use cookie::{
    get_session_id_from_headers, new_session_header, prepare_logout_response, session_cookie_header,
};
pub use lock::SessionLocks;
pub use store::SessionStore;

pub(crate) use store::AUTHZ_PREFIX;
