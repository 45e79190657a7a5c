//! Typed access to export records in a [`Cache`].

use crate::Cache;
use hoard_types::{ExportError, ExportStatus, Result, data_key};
use std::sync::Arc;

/// Reads and writes export status records and data blobs.
///
/// Status records live under the job id; data accumulates under
/// `"{id}-data"`.
#[derive(Debug, Clone)]
pub struct ExportStore {
    cache: Arc<dyn Cache>,
}

impl ExportStore {
    /// Creates a store over `cache`.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Returns the underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Loads the status record for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotFound`] if no record exists,
    /// [`ExportError::Decode`] if the record is corrupt, or
    /// [`ExportError::CacheUnavailable`] if the cache fails.
    pub async fn status(&self, id: &str) -> Result<ExportStatus> {
        let raw = self
            .cache
            .get(id)
            .await?
            .ok_or_else(|| ExportError::NotFound(id.to_string()))?;

        ExportStatus::from_json(&raw).map_err(|source| ExportError::Decode {
            id: id.to_string(),
            source,
        })
    }

    /// Overwrites the status record of `status.id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn put_status(&self, status: &ExportStatus) -> Result<()> {
        let json = status.to_json()?;
        self.cache.set(&status.id, &json).await?;
        Ok(())
    }

    /// Appends `chunk` to the data blob of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn append_data(&self, id: &str, chunk: &[u8]) -> Result<()> {
        self.cache.append(&data_key(id), chunk).await?;
        Ok(())
    }

    /// Expires both keys of `id` after `ttl_secs`.
    ///
    /// The two expirations are independent calls; both are issued before
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if either call fails.
    pub async fn expire_job(&self, id: &str, ttl_secs: u64) -> Result<()> {
        self.cache.expire(id, ttl_secs).await?;
        self.cache.expire(&data_key(id), ttl_secs).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCache;
    use hoard_types::StatusKind;

    fn store() -> (MemoryCache, ExportStore) {
        let cache = MemoryCache::new();
        let store = ExportStore::new(Arc::new(cache.clone()));
        (cache, store)
    }

    #[tokio::test]
    async fn test_status_not_found() {
        let (_, store) = store();
        let err = store.status("missing").await.unwrap_err();
        assert!(matches!(err, ExportError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_put_and_read_status() {
        let (_, store) = store();
        store
            .put_status(&ExportStatus::pending("job".into()))
            .await
            .unwrap();

        let status = store.status("job").await.unwrap();
        assert_eq!(status.status, StatusKind::Pending);
        assert_eq!(status.id, "job");
    }

    #[tokio::test]
    async fn test_corrupt_status_is_not_not_found() {
        let (cache, store) = store();
        cache.set("job", b"not json").await.unwrap();

        let err = store.status("job").await.unwrap_err();
        assert!(matches!(err, ExportError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_append_and_expire_job() {
        let (cache, store) = store();
        store
            .put_status(&ExportStatus::complete("job".into()))
            .await
            .unwrap();
        store.append_data("job", b"hello ").await.unwrap();
        store.append_data("job", b"world").await.unwrap();
        store.expire_job("job", 3600).await.unwrap();

        assert_eq!(
            cache.get("job-data").await.unwrap().unwrap().as_ref(),
            b"hello world"
        );
        assert_eq!(cache.ttl("job").await.unwrap(), Some(3600));
        assert_eq!(cache.ttl("job-data").await.unwrap(), Some(3600));
    }

    #[tokio::test]
    async fn test_cache_failure_propagates() {
        let (cache, store) = store();
        cache.inject_fault(crate::CacheOp::Get);

        let err = store.status("job").await.unwrap_err();
        assert!(matches!(err, ExportError::CacheUnavailable(_)));
    }
}
