//! Redirect targets of the axum integration

use std::sync::LazyLock;

/// Where a completed login sends the browser.
/// Default: "/"
pub static CARRIER_OIDC_REDIRECT_USER: LazyLock<String> = LazyLock::new(|| {
    std::env::var("CARRIER_OIDC_REDIRECT_USER").unwrap_or_else(|_| "/".to_string())
});

/// Where unauthenticated page requests and logouts are sent.
/// Default: "/"
pub static CARRIER_OIDC_REDIRECT_ANON: LazyLock<String> = LazyLock::new(|| {
    std::env::var("CARRIER_OIDC_REDIRECT_ANON").unwrap_or_else(|_| "/".to_string())
});
