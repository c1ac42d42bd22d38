use std::{env, sync::Arc, sync::LazyLock};
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore, SharedCacheStore};

/// Cache backend selector: "memory" or "redis".
/// Default: "memory"
pub static CACHE_STORE_TYPE: LazyLock<String> =
    LazyLock::new(|| env::var("CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string()));

/// Connection URL for the cache backend. Ignored by the memory backend.
/// Default: "redis://localhost:6379"
pub static CACHE_STORE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("CACHE_STORE_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
});

/// Wrap a concrete store so it can be shared across requests.
pub fn shared_cache_store(store: impl CacheStore) -> SharedCacheStore {
    Arc::new(Mutex::new(Box::new(store)))
}

async fn build_cache_store(
    store_type: &str,
    store_url: &str,
) -> Result<SharedCacheStore, StorageError> {
    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Box<dyn CacheStore> = match store_type {
        "memory" => Box::new(InMemoryCacheStore::new()),
        "redis" => {
            let store = RedisCacheStore::new(store_url)?;
            store.init().await.inspect_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
            })?;
            Box::new(store)
        }
        t => {
            return Err(StorageError::Config(format!(
                "Unsupported cache store type: {t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    tracing::info!("Connected to cache store: type={}", store_type);
    Ok(Arc::new(Mutex::new(store)))
}

/// Build the cache store selected by `CACHE_STORE_TYPE` / `CACHE_STORE_URL`.
pub async fn cache_store_from_env() -> Result<SharedCacheStore, StorageError> {
    build_cache_store(CACHE_STORE_TYPE.as_str(), CACHE_STORE_URL.as_str()).await
}
