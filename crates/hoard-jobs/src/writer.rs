//! Cache-backed stream writer.
//!
//! The sink half of a single job's transfer. Every chunk is appended to the
//! job's data key and followed by a PENDING status write; both round trips
//! complete before the next chunk is pulled from the source, so the source
//! is drained no faster than the cache persists it.

use crate::ExportSource;
use futures::StreamExt;
use hoard_cache::ExportStore;
use hoard_types::{ExportStatus, JobId, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How a call to [`CacheWriter::pump`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpEnd {
    /// The source reached end-of-stream and every chunk was persisted.
    Drained,
    /// The cancellation token fired first.
    Cancelled,
}

/// Persists one job's byte stream into the cache.
#[derive(Debug)]
pub struct CacheWriter {
    id: JobId,
    store: ExportStore,
    chunks_written: u64,
    bytes_written: u64,
    complete_written: bool,
}

impl CacheWriter {
    /// Creates a writer for job `id`.
    #[must_use]
    pub const fn new(id: JobId, store: ExportStore) -> Self {
        Self {
            id,
            store,
            chunks_written: 0,
            bytes_written: 0,
            complete_written: false,
        }
    }

    /// Returns the job id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the number of chunks persisted so far.
    #[must_use]
    pub const fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// Returns the number of bytes persisted so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns true once the COMPLETE record has been stored, even if the
    /// expirations that follow it failed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete_written
    }

    /// Appends `chunk` to the data key, then marks the job PENDING.
    ///
    /// # Errors
    ///
    /// Returns [`hoard_types::ExportError::CacheUnavailable`] if either
    /// cache write fails. Nothing is retried.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.store.append_data(&self.id, chunk).await?;
        self.store
            .put_status(&ExportStatus::pending(self.id.clone()))
            .await?;

        self.chunks_written += 1;
        self.bytes_written += chunk.len() as u64;
        trace!(id = %self.id, len = chunk.len(), "chunk persisted");
        Ok(())
    }

    /// Marks the job COMPLETE and expires both of its keys after `ttl_secs`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three cache calls fails.
    pub async fn finish(&mut self, ttl_secs: u64) -> Result<()> {
        self.store
            .put_status(&ExportStatus::complete(self.id.clone()))
            .await?;
        self.complete_written = true;
        self.store.expire_job(&self.id, ttl_secs).await?;

        debug!(
            id = %self.id,
            chunks = self.chunks_written,
            bytes = self.bytes_written,
            "export complete"
        );
        Ok(())
    }

    /// Drains `source` into the cache until it ends or `cancel` fires.
    ///
    /// Cancellation is observed both while waiting for the next chunk and
    /// while a chunk is being persisted. The status is never touched on the
    /// cancelled path; whoever cancelled owns the terminal write.
    ///
    /// # Errors
    ///
    /// Returns [`hoard_types::ExportError::Source`] if the source yields an
    /// I/O error, or a cache error from [`CacheWriter::write_chunk`].
    pub async fn pump(
        &mut self,
        source: &mut ExportSource,
        cancel: &CancellationToken,
    ) -> Result<PumpEnd> {
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(PumpEnd::Cancelled),
                next = source.next() => next,
            };

            let chunk = match next {
                None => return Ok(PumpEnd::Drained),
                Some(chunk) => chunk?,
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(PumpEnd::Cancelled),
                written = self.write_chunk(&chunk) => written?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hoard_cache::{Cache, CacheOp, MemoryCache};
    use hoard_types::{EXPORT_TTL_SECS, ExportError, StatusKind};
    use std::sync::Arc;

    fn writer(id: &str) -> (MemoryCache, CacheWriter) {
        let cache = MemoryCache::with_journal();
        let store = ExportStore::new(Arc::new(cache.clone()));
        (cache, CacheWriter::new(id.to_string(), store))
    }

    #[tokio::test]
    async fn test_write_chunk_appends_then_sets_pending() {
        let (cache, mut writer) = writer("test-export-id");
        writer
            .write_chunk(b"This is a test data chunk")
            .await
            .unwrap();

        let journal = cache.journal();
        assert_eq!(journal[0].op, CacheOp::Append);
        assert_eq!(journal[0].key, "test-export-id-data");
        assert_eq!(journal[0].value.as_ref(), b"This is a test data chunk");
        assert_eq!(journal[1].op, CacheOp::Set);
        assert_eq!(
            journal[1].value.as_ref(),
            br#"{"status":"PENDING","id":"test-export-id"}"#
        );
        assert_eq!(writer.chunks_written(), 1);
        assert_eq!(writer.bytes_written(), 25);
    }

    #[tokio::test]
    async fn test_finish_sets_complete_and_expires_both_keys() {
        let (cache, mut writer) = writer("job");
        writer.write_chunk(b"abc").await.unwrap();
        writer.finish(EXPORT_TTL_SECS).await.unwrap();

        let status = ExportStatus::from_json(&cache.get("job").await.unwrap().unwrap()).unwrap();
        assert_eq!(status.status, StatusKind::Complete);
        assert_eq!(cache.ttl("job").await.unwrap(), Some(EXPORT_TTL_SECS));
        assert_eq!(cache.ttl("job-data").await.unwrap(), Some(EXPORT_TTL_SECS));
    }

    #[tokio::test]
    async fn test_finish_reports_stored_complete_when_expire_fails() {
        let (expire_broken, mut expired) = writer("job");
        expire_broken.inject_fault(CacheOp::Expire);
        assert!(expired.finish(EXPORT_TTL_SECS).await.is_err());
        assert!(expired.is_complete());

        let (set_broken, mut unset) = writer("other");
        set_broken.inject_fault(CacheOp::Set);
        assert!(unset.finish(EXPORT_TTL_SECS).await.is_err());
        assert!(!unset.is_complete());
    }

    #[tokio::test]
    async fn test_pump_drains_in_order() {
        let (cache, mut writer) = writer("job");
        let mut source = ExportSource::from_chunks(["a", "b", "c"]);

        let end = writer
            .pump(&mut source, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(end, PumpEnd::Drained);
        assert_eq!(cache.get("job-data").await.unwrap().unwrap().as_ref(), b"abc");
        assert_eq!(writer.chunks_written(), 3);
    }

    #[tokio::test]
    async fn test_pump_stops_when_cancelled() {
        let (cache, mut writer) = writer("job");
        let mut source = ExportSource::from_chunks(["a", "b"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let end = writer.pump(&mut source, &cancel).await.unwrap();

        assert_eq!(end, PumpEnd::Cancelled);
        assert!(cache.journal().is_empty());
    }

    #[tokio::test]
    async fn test_pump_surfaces_source_error() {
        let (_, mut writer) = writer("job");
        let mut source = ExportSource::new(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ok")),
            Err(std::io::Error::other("socket reset")),
        ]));

        let err = writer
            .pump(&mut source, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Source(_)));
        assert_eq!(writer.chunks_written(), 1);
    }

    #[tokio::test]
    async fn test_cache_failure_fails_the_write() {
        let (cache, mut writer) = writer("job");
        cache.inject_fault(CacheOp::Append);

        let err = writer.write_chunk(b"x").await.unwrap_err();
        assert!(matches!(err, ExportError::CacheUnavailable(_)));
        assert!(!cache.contains_key("job"));
    }
}
