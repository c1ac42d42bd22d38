mod config;
mod memory;
mod redis;
mod types;

pub use config::{CACHE_STORE_TYPE, CACHE_STORE_URL, cache_store_from_env, shared_cache_store};
pub use types::{CacheStore, InMemoryCacheStore, RedisCacheStore, SharedCacheStore};
