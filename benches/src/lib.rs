//! Benchmark helpers for hoard exports.

use bytes::Bytes;
use hoard_lib::{
    ExportManager, ExportSource, ExportStatus, ExporterDependencies, MemoryCache, Result, User,
};
use std::sync::Arc;
use std::time::Duration;

/// Shape of a benchmarked export.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkConfig {
    /// Total payload size in bytes.
    pub total_bytes: usize,
    /// Size of each chunk yielded by the source.
    pub chunk_size: usize,
}

impl BenchmarkConfig {
    /// Number of chunks the source yields.
    #[must_use]
    pub const fn chunk_count(&self) -> usize {
        self.total_bytes.div_ceil(self.chunk_size)
    }

    /// Builds the source's chunks.
    #[must_use]
    pub fn chunks(&self) -> Vec<Bytes> {
        let payload = Bytes::from(vec![b'x'; self.total_bytes]);
        (0..self.chunk_count())
            .map(|i| {
                let start = i * self.chunk_size;
                let end = (start + self.chunk_size).min(self.total_bytes);
                payload.slice(start..end)
            })
            .collect()
    }
}

/// A manager over a fresh in-memory cache.
#[must_use]
pub fn memory_manager() -> ExportManager {
    ExportManager::new(ExporterDependencies::new(Arc::new(MemoryCache::new())))
}

/// Runs one export of `chunks` to completion.
///
/// # Errors
///
/// Returns any error raised while starting or polling the export.
pub async fn run_export(manager: &ExportManager, chunks: Vec<Bytes>) -> Result<ExportStatus> {
    let user = User::new("bench", ["exporter"]);
    let status = manager
        .start_export(&user, ExportSource::from_chunks(chunks))
        .await?;
    manager
        .wait_until_finished(&status.id, Duration::from_micros(50))
        .await
}
