//! The task that runs one job's transfer, and the terminal writes shared with
//! the manager.

use crate::{CacheWriter, ExportLog, ExportSource, JobRegistry, PumpEnd, TransferControl};
use hoard_cache::ExportStore;
use hoard_types::{ExportStatus, JobId, Result, StatusKind};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Writes CANCELLED for `id` and expires both of its keys.
///
/// If any of the writes fails the job is recorded as owing its terminal
/// write, so the next cancel repeats all three.
pub(crate) async fn write_cancelled(
    store: &ExportStore,
    registry: &JobRegistry,
    id: &str,
    ttl_secs: u64,
) -> Result<ExportStatus> {
    let cancelled = ExportStatus::cancelled(id.to_string());
    let written = async {
        store.put_status(&cancelled).await?;
        store.expire_job(id, ttl_secs).await
    };

    if let Err(e) = written.await {
        registry.record_unwritten(id, StatusKind::Cancelled);
        return Err(e);
    }
    Ok(cancelled)
}

/// Expires both keys of a job whose COMPLETE record is already stored.
pub(crate) async fn expire_completed(
    store: &ExportStore,
    registry: &JobRegistry,
    id: &str,
    ttl_secs: u64,
) -> Result<()> {
    if let Err(e) = store.expire_job(id, ttl_secs).await {
        registry.record_unwritten(id, StatusKind::Complete);
        return Err(e);
    }
    Ok(())
}

/// Everything a transfer task needs besides its source.
#[derive(Debug)]
pub(crate) struct Transfer {
    pub(crate) id: JobId,
    pub(crate) store: ExportStore,
    pub(crate) registry: Arc<JobRegistry>,
    pub(crate) log: Arc<dyn ExportLog>,
    pub(crate) ttl_secs: u64,
    pub(crate) control: TransferControl,
}

impl Transfer {
    /// Streams `source` into the cache and settles the job.
    ///
    /// On end-of-stream the task settles the job COMPLETE if it wins the
    /// registry removal. On a source or cache error it settles CANCELLED the
    /// same way. When cancelled from outside it only releases the source.
    pub(crate) async fn run(self, mut source: ExportSource) {
        let Self {
            id,
            store,
            registry,
            log,
            ttl_secs,
            control,
        } = self;

        let mut writer = CacheWriter::new(id.clone(), store.clone());
        let result = writer.pump(&mut source, control.cancel_token()).await;

        drop(source);
        control.release();

        match result {
            Ok(PumpEnd::Drained) => {
                if registry.remove(&id, StatusKind::Complete).is_none() {
                    debug!(%id, "drained after cancellation; leaving status to canceller");
                    return;
                }
                match writer.finish(ttl_secs).await {
                    Ok(()) => log.log(&format!(
                        "export {id} complete: {} bytes in {} chunks",
                        writer.bytes_written(),
                        writer.chunks_written()
                    )),
                    Err(e) => {
                        error!(%id, error = %e, "failed to finalize export");
                        log.log(&format!("export {id} failed to finalize: {e}"));

                        if writer.is_complete() {
                            registry.record_unwritten(&id, StatusKind::Complete);
                        } else {
                            registry.settle(&id, StatusKind::Cancelled);
                            settle_cancelled(&store, &registry, log.as_ref(), &id, ttl_secs).await;
                        }
                    }
                }
            }
            Ok(PumpEnd::Cancelled) => {
                debug!(%id, bytes = writer.bytes_written(), "transfer stopped by cancellation");
            }
            Err(e) => {
                warn!(%id, error = %e, "transfer failed");
                log.log(&format!("export {id} failed: {e}"));

                if registry.remove(&id, StatusKind::Cancelled).is_none() {
                    return;
                }
                settle_cancelled(&store, &registry, log.as_ref(), &id, ttl_secs).await;
            }
        }
    }
}

async fn settle_cancelled(
    store: &ExportStore,
    registry: &JobRegistry,
    log: &dyn ExportLog,
    id: &str,
    ttl_secs: u64,
) {
    if let Err(e) = write_cancelled(store, registry, id, ttl_secs).await {
        error!(%id, error = %e, "failed to record failed export");
        log.log(&format!("export {id} could not be marked cancelled: {e}"));
    }
}
