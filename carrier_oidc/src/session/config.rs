use std::sync::LazyLock;

/// Name of the cookie carrying the opaque session id.
/// Default: "__Host-CarrierSessionId"
pub static SESSION_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_NAME")
        .ok()
        .unwrap_or("__Host-CarrierSessionId".to_string())
});

/// Lifetime of the session cookie and of the ambient login bound to it, in seconds.
pub static SESSION_COOKIE_MAX_AGE: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_MAX_AGE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600)
});
