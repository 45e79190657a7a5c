//! Cache backend selection.

use crate::{Cache, CacheResult, MemoryCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the cache backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL. `None` selects the in-process [`MemoryCache`].
    pub redis_url: Option<String>,
}

impl CacheConfig {
    /// Configuration for a Redis backend at `url`.
    #[must_use]
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            redis_url: Some(url.into()),
        }
    }
}

/// Opens the backend described by `config`.
///
/// # Errors
///
/// Returns an error if a Redis URL is configured but the server cannot be
/// reached, or if this build lacks the `redis` feature.
pub async fn open_cache(config: &CacheConfig) -> CacheResult<Arc<dyn Cache>> {
    match config.redis_url.as_deref() {
        None => Ok(Arc::new(MemoryCache::new())),
        #[cfg(feature = "redis")]
        Some(url) => Ok(Arc::new(crate::RedisCache::connect(url).await?)),
        #[cfg(not(feature = "redis"))]
        Some(url) => Err(hoard_types::CacheError::Unavailable(format!(
            "cannot connect to {url}: built without the `redis` feature"
        ))),
    }
}
