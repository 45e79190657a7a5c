//! In-process cache backend.
//!
//! Values and expirations live in separate maps. Expired keys are evicted
//! lazily on access, and SET clears a key's expiration the same way Redis does.

use crate::{Cache, CacheOp, CacheResult, MAX_TTL_SECS};
use async_trait::async_trait;
use bytes::Bytes;
use hoard_types::CacheError;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A mutation recorded by a journaling [`MemoryCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheWrite {
    /// The operation performed.
    pub op: CacheOp,
    /// The key it targeted.
    pub key: String,
    /// The payload (empty for EXPIRE).
    pub value: Bytes,
}

#[derive(Debug, Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    expirations: HashMap<String, Instant>,
    faults: HashSet<CacheOp>,
    journal: Option<Vec<CacheWrite>>,
}

impl Inner {
    fn check(&self, op: CacheOp) -> CacheResult<()> {
        if self.faults.contains(&op) {
            return Err(CacheError::Unavailable(format!("{op} rejected by injected fault")));
        }
        Ok(())
    }

    fn is_expired(&self, key: &str, now: Instant) -> bool {
        self.expirations.get(key).is_some_and(|at| *at <= now)
    }

    fn evict_if_expired(&mut self, key: &str) {
        if self.is_expired(key, Instant::now()) {
            self.data.remove(key);
            self.expirations.remove(key);
        }
    }

    fn record(&mut self, op: CacheOp, key: &str, value: &[u8]) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(CacheWrite {
                op,
                key: key.to_string(),
                value: Bytes::copy_from_slice(value),
            });
        }
    }
}

/// Thread-safe in-memory [`Cache`].
///
/// Cloning yields another handle to the same store. Faults can be injected per
/// operation to exercise failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache that records every mutation.
    #[must_use]
    pub fn with_journal() -> Self {
        let cache = Self::new();
        cache.inner.lock().journal = Some(Vec::new());
        cache
    }

    /// Makes every future `op` fail with [`CacheError::Unavailable`].
    pub fn inject_fault(&self, op: CacheOp) {
        self.inner.lock().faults.insert(op);
    }

    /// Removes a previously injected fault.
    pub fn clear_fault(&self, op: CacheOp) {
        self.inner.lock().faults.remove(&op);
    }

    /// Returns the recorded mutations, oldest first.
    ///
    /// Empty unless the cache was created with [`MemoryCache::with_journal`].
    #[must_use]
    pub fn journal(&self) -> Vec<CacheWrite> {
        self.inner.lock().journal.clone().unwrap_or_default()
    }

    /// Returns true if `key` holds a live value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let inner = self.inner.lock();
        !inner.is_expired(key, Instant::now()) && inner.data.contains_key(key)
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        let now = Instant::now();
        inner
            .data
            .keys()
            .filter(|key| !inner.is_expired(key, now))
            .count()
    }

    /// Returns true if no live key exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired key, returning how many were evicted.
    pub fn evict_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let expired: Vec<String> = inner
            .expirations
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.data.remove(key);
            inner.expirations.remove(key);
        }
        expired.len()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let mut inner = self.inner.lock();
        inner.check(CacheOp::Get)?;
        inner.evict_if_expired(key);
        Ok(inner.data.get(key).map(|v| Bytes::copy_from_slice(v)))
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.check(CacheOp::Set)?;
        inner.data.insert(key.to_string(), value.to_vec());
        inner.expirations.remove(key);
        inner.record(CacheOp::Set, key, value);
        Ok(())
    }

    async fn append(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.check(CacheOp::Append)?;
        inner.evict_if_expired(key);
        inner
            .data
            .entry(key.to_string())
            .or_default()
            .extend_from_slice(value);
        inner.record(CacheOp::Append, key, value);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.check(CacheOp::Expire)?;
        inner.evict_if_expired(key);
        // Redis ignores EXPIRE on a missing key.
        let ttl = Duration::from_secs(ttl_secs.min(MAX_TTL_SECS));
        if let Some(at) = Instant::now().checked_add(ttl)
            && inner.data.contains_key(key)
        {
            inner.expirations.insert(key.to_string(), at);
        }
        inner.record(CacheOp::Expire, key, &[]);
        Ok(())
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<u64>> {
        let mut inner = self.inner.lock();
        inner.check(CacheOp::Get)?;
        inner.evict_if_expired(key);
        let now = Instant::now();
        Ok(inner.expirations.get(key).map(|at| {
            let remaining = at.saturating_duration_since(now);
            remaining.as_millis().div_ceil(1000) as u64
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_append_creates_then_extends() {
        let cache = MemoryCache::new();
        cache.append("k", b"ab").await.unwrap();
        cache.append("k", b"cd").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().unwrap(), Bytes::from_static(b"abcd"));
    }

    #[tokio::test]
    async fn test_set_clears_expiration() {
        let cache = MemoryCache::new();
        cache.set("k", b"v1").await.unwrap();
        cache.expire("k", 60).await.unwrap();
        assert_eq!(cache.ttl("k").await.unwrap(), Some(60));

        cache.set("k", b"v2").await.unwrap();
        assert_eq!(cache.ttl("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_clamped() {
        let cache = MemoryCache::new();
        cache.set("k", b"v").await.unwrap();
        cache.expire("k", u64::MAX).await.unwrap();

        assert_eq!(cache.ttl("k").await.unwrap(), Some(MAX_TTL_SECS));
        assert!(cache.contains_key("k"));
    }

    #[tokio::test]
    async fn test_expire_missing_key_is_ignored() {
        let cache = MemoryCache::new();
        cache.expire("ghost", 10).await.unwrap();
        assert!(!cache.contains_key("ghost"));
        assert_eq!(cache.ttl("ghost").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_keys_read_as_absent() {
        let cache = MemoryCache::new();
        cache.set("k", b"v").await.unwrap();
        cache.expire("k", 5).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.get("k").await.unwrap().is_some());
        assert_eq!(cache.ttl("k").await.unwrap(), Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired() {
        let cache = MemoryCache::new();
        cache.set("a", b"1").await.unwrap();
        cache.set("b", b"2").await.unwrap();
        cache.expire("a", 1).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("b"));
    }

    #[tokio::test]
    async fn test_injected_fault() {
        let cache = MemoryCache::new();
        cache.inject_fault(CacheOp::Append);

        let err = cache.append("k", b"x").await.unwrap_err();
        assert!(matches!(err, CacheError::Unavailable(_)));
        cache.set("k", b"ok").await.unwrap();

        cache.clear_fault(CacheOp::Append);
        cache.append("k", b"!").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().unwrap(), Bytes::from_static(b"ok!"));
    }

    #[tokio::test]
    async fn test_journal_records_mutations() {
        let cache = MemoryCache::with_journal();
        cache.set("k", b"v").await.unwrap();
        cache.append("k-data", b"x").await.unwrap();
        let _ = cache.get("k").await.unwrap();

        let journal = cache.journal();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].op, CacheOp::Set);
        assert_eq!(journal[1].key, "k-data");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.set("k", b"v").await.unwrap();
        assert!(other.contains_key("k"));
    }
}
