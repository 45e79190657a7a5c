//! Redis cache backend.

use crate::{Cache, CacheResult, MAX_TTL_SECS};
use async_trait::async_trait;
use bytes::Bytes;
use hoard_types::CacheError;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// [`Cache`] backed by a Redis server.
///
/// Uses a [`ConnectionManager`], which multiplexes commands over one
/// connection and reconnects transparently. Each command is a single round
/// trip; failures map to [`CacheError::Unavailable`].
#[derive(Clone)]
pub struct RedisCache {
    url: String,
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;
        tracing::debug!(url, "connected to redis");
        Ok(Self {
            url: url.to_string(),
            conn,
        })
    }

    /// Returns the URL this cache is connected to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").field("url", &self.url).finish_non_exhaustive()
    }
}

fn unavailable(e: redis::RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(unavailable)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await.map_err(unavailable)
    }

    async fn append(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.append::<_, _, ()>(key, value).await.map_err(unavailable)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl_secs.min(MAX_TTL_SECS)).unwrap_or(i64::MAX);
        conn.expire::<_, ()>(key, seconds).await.map_err(unavailable)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<u64>> {
        let mut conn = self.conn.clone();
        // -2: missing key, -1: no expiration.
        let remaining: i64 = conn.ttl(key).await.map_err(unavailable)?;
        Ok(u64::try_from(remaining).ok())
    }
}
