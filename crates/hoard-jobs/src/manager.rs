//! Export job manager.
//!
//! Entry point for starting, querying and cancelling exports. Each started
//! export runs on its own tokio task; the manager only coordinates through
//! the cache and the [`JobRegistry`].

use crate::transfer::{Transfer, expire_completed, write_cancelled};
use crate::{
    ExportLog, ExportSource, ExporterConfig, IdGenerator, JobHandle, JobRegistry,
    PermissionChecker, StaticPermissions, TracingLog, UuidGenerator,
};
use hoard_cache::{Cache, ExportStore};
use hoard_types::{ExportError, ExportStatus, Result, StatusKind, User};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Collaborators an [`ExportManager`] is built from.
#[derive(Debug, Clone)]
pub struct ExporterDependencies {
    /// Cache holding status records and data blobs.
    pub cache: Arc<dyn Cache>,
    /// Registry of in-flight transfers.
    pub registry: Arc<JobRegistry>,
    /// Permission service.
    pub permissions: Arc<dyn PermissionChecker>,
    /// Source of job ids.
    pub ids: Arc<dyn IdGenerator>,
    /// Lifecycle message sink.
    pub log: Arc<dyn ExportLog>,
    /// Manager configuration.
    pub config: ExporterConfig,
}

impl ExporterDependencies {
    /// Dependencies over `cache` with a fresh registry, permissions taken
    /// from the user record, UUID ids and `tracing` logging.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            registry: Arc::new(JobRegistry::new()),
            permissions: Arc::new(StaticPermissions),
            ids: Arc::new(UuidGenerator),
            log: Arc::new(TracingLog),
            config: ExporterConfig::default(),
        }
    }
}

/// Starts, tracks and cancels export jobs.
#[derive(Debug, Clone)]
pub struct ExportManager {
    store: ExportStore,
    registry: Arc<JobRegistry>,
    permissions: Arc<dyn PermissionChecker>,
    ids: Arc<dyn IdGenerator>,
    log: Arc<dyn ExportLog>,
    config: ExporterConfig,
}

impl ExportManager {
    /// Creates a manager from its collaborators.
    #[must_use]
    pub fn new(deps: ExporterDependencies) -> Self {
        Self {
            store: ExportStore::new(deps.cache),
            registry: deps.registry,
            permissions: deps.permissions,
            ids: deps.ids,
            log: deps.log,
            config: deps.config,
        }
    }

    /// Returns the manager configuration.
    #[must_use]
    pub const fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// Returns the registry of in-flight transfers.
    #[must_use]
    pub const fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Starts exporting `source` on behalf of `user`.
    ///
    /// Returns once the CREATED record is in the cache; the transfer itself
    /// continues in the background.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::PermissionDenied`] if `user` lacks the
    /// configured permission (no id is generated and nothing is written), or
    /// [`ExportError::CacheUnavailable`] if the initial write fails.
    pub async fn start_export(&self, user: &User, source: ExportSource) -> Result<ExportStatus> {
        self.log.log("starting export");
        self.authorize(user).await?;

        let id = self.ids.new_id();
        if self.registry.get(&id) {
            return Err(ExportError::DuplicateJob(id));
        }

        let status = ExportStatus::created(id.clone());
        self.store.put_status(&status).await?;

        let (handle, control) = JobHandle::new(id.clone());
        self.registry.put(handle)?;

        let transfer = Transfer {
            id: id.clone(),
            store: self.store.clone(),
            registry: Arc::clone(&self.registry),
            log: Arc::clone(&self.log),
            ttl_secs: self.config.ttl_secs,
            control,
        };
        tokio::spawn(transfer.run(source));

        info!(%id, user = %user.id, "export started");
        Ok(status)
    }

    /// Returns the stored status of export `id`.
    ///
    /// Works the same for in-flight and finished jobs.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotFound`] if no record exists for `id`.
    pub async fn get_export_status(&self, id: &str) -> Result<ExportStatus> {
        self.store.status(id).await
    }

    /// Cancels export `id`, waiting until its source is released and the
    /// CANCELLED record is written.
    ///
    /// If another caller already settled the job, nothing is written and the
    /// settled status is returned. A terminal write that failed earlier is
    /// repeated by the next call.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotFound`] for an unknown id,
    /// [`ExportError::InvalidState`] if the export already completed, or
    /// [`ExportError::CacheUnavailable`] if the terminal write fails.
    pub async fn cancel_export(&self, id: &str) -> Result<ExportStatus> {
        let current = self.get_export_status(id).await?;
        if !current.status.can_transition_to(StatusKind::Cancelled) {
            return self.cancel_finished(current).await;
        }

        let Some(handle) = self.registry.remove(id, StatusKind::Cancelled) else {
            if let Some(owed) = self.registry.take_unwritten(id) {
                return self.repeat_terminal_write(id, owed).await;
            }
            return match self.registry.settled(id) {
                Some(StatusKind::Complete) => Err(invalid_state(id, StatusKind::Complete)),
                Some(StatusKind::Cancelled) => Ok(ExportStatus::cancelled(id.to_string())),
                _ => {
                    debug!(%id, status = %current.status, "no active transfer to cancel");
                    Ok(current)
                }
            };
        };

        handle.terminate().await;

        let cancelled =
            write_cancelled(&self.store, &self.registry, id, self.config.ttl_secs).await?;
        self.log.log(&format!("export {id} cancelled"));
        Ok(cancelled)
    }

    /// Like [`ExportManager::cancel_export`], but first checks that `user`
    /// holds the configured permission.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::PermissionDenied`] before touching the job if
    /// the check fails, otherwise whatever `cancel_export` returns.
    pub async fn cancel_export_as(&self, user: &User, id: &str) -> Result<ExportStatus> {
        self.authorize(user).await?;
        self.cancel_export(id).await
    }

    /// Polls the status of `id` every `interval` until it is finished.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`ExportManager::get_export_status`].
    pub async fn wait_until_finished(&self, id: &str, interval: Duration) -> Result<ExportStatus> {
        self.wait_until_finished_with(id, interval, |_| {}).await
    }

    /// Like [`ExportManager::wait_until_finished`], calling `on_poll` with
    /// every status read, including the final one.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`ExportManager::get_export_status`].
    pub async fn wait_until_finished_with<F>(
        &self,
        id: &str,
        interval: Duration,
        mut on_poll: F,
    ) -> Result<ExportStatus>
    where
        F: FnMut(&ExportStatus) + Send,
    {
        loop {
            let status = self.get_export_status(id).await?;
            on_poll(&status);
            if status.is_finished() {
                return Ok(status);
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn cancel_finished(&self, current: ExportStatus) -> Result<ExportStatus> {
        if let Some(owed) = self.registry.take_unwritten(&current.id) {
            return self.repeat_terminal_write(&current.id, owed).await;
        }
        match current.status {
            StatusKind::Cancelled => Ok(current),
            status => Err(invalid_state(&current.id, status)),
        }
    }

    /// Finishes a terminal write that failed on an earlier attempt.
    async fn repeat_terminal_write(&self, id: &str, owed: StatusKind) -> Result<ExportStatus> {
        let ttl_secs = self.config.ttl_secs;
        info!(%id, status = %owed, "repeating terminal write");
        match owed {
            StatusKind::Complete => {
                expire_completed(&self.store, &self.registry, id, ttl_secs).await?;
                Err(invalid_state(id, StatusKind::Complete))
            }
            _ => {
                let cancelled = write_cancelled(&self.store, &self.registry, id, ttl_secs).await?;
                self.log.log(&format!("export {id} cancelled"));
                Ok(cancelled)
            }
        }
    }

    async fn authorize(&self, user: &User) -> Result<()> {
        let permission = &self.config.required_permission;
        if self.permissions.check_permission(user, permission).await {
            return Ok(());
        }

        warn!(user = %user.id, %permission, "permission denied");
        self.log.log(&format!("user {} lacks permission {permission}", user.id));
        Err(ExportError::PermissionDenied {
            user: user.id.clone(),
            permission: permission.clone(),
        })
    }
}

fn invalid_state(id: &str, status: StatusKind) -> ExportError {
    ExportError::InvalidState {
        id: id.to_string(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryLog, SequenceIdGenerator};
    use hoard_cache::MemoryCache;

    fn manager() -> (MemoryCache, Arc<SequenceIdGenerator>, Arc<MemoryLog>, ExportManager) {
        let cache = MemoryCache::new();
        let ids = Arc::new(SequenceIdGenerator::new("job"));
        let log = Arc::new(MemoryLog::new());
        let deps = ExporterDependencies {
            ids: ids.clone(),
            log: log.clone(),
            ..ExporterDependencies::new(Arc::new(cache.clone()))
        };
        (cache, ids, log, ExportManager::new(deps))
    }

    fn exporter() -> User {
        User::new("1", ["exporter"])
    }

    #[tokio::test]
    async fn test_start_export_returns_created() {
        let (_, _, log, manager) = manager();

        let status = manager
            .start_export(&exporter(), ExportSource::from_chunks(["x"]))
            .await
            .unwrap();

        assert_eq!(status, ExportStatus::created("job-1".to_string()));
        assert!(log.contains("starting export"));
        manager
            .get_export_status(&status.id)
            .await
            .expect("CREATED must be readable as soon as start returns");
    }

    #[tokio::test]
    async fn test_permission_denied_writes_nothing() {
        let (cache, ids, _, manager) = manager();
        let user = User::new("2", ["reader"]);

        let err = manager
            .start_export(&user, ExportSource::from_chunks(["x"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::PermissionDenied { .. }));
        assert_eq!(ids.issued(), 0);
        assert!(cache.is_empty());
        assert!(manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_status_of_unknown_id() {
        let (_, _, _, manager) = manager();
        let err = manager.get_export_status("SomeID").await.unwrap_err();
        assert!(matches!(err, ExportError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_unknown_id() {
        let (_, _, _, manager) = manager();
        let err = manager.cancel_export("SomeID").await.unwrap_err();
        assert!(err.to_string().starts_with("No export found for id:"));
    }

    #[tokio::test]
    async fn test_cancel_as_requires_permission() {
        let (_, _, _, manager) = manager();
        let status = manager
            .start_export(&exporter(), ExportSource::new(futures::stream::pending()))
            .await
            .unwrap();

        let err = manager
            .cancel_export_as(&User::new("3", Vec::<String>::new()), &status.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::PermissionDenied { .. }));
        assert!(manager.registry().get(&status.id));

        let cancelled = manager.cancel_export_as(&exporter(), &status.id).await.unwrap();
        assert_eq!(cancelled.status, StatusKind::Cancelled);
    }

    #[tokio::test]
    async fn test_wait_until_finished() {
        let (_, _, log, manager) = manager();
        let status = manager
            .start_export(&exporter(), ExportSource::from_chunks(["a", "b"]))
            .await
            .unwrap();

        let done = manager
            .wait_until_finished(&status.id, Duration::from_millis(5))
            .await
            .unwrap();

        assert_eq!(done.status, StatusKind::Complete);
        assert!(manager.registry().is_empty());
        assert!(log.contains("2 bytes in 2 chunks"));
    }

    #[tokio::test]
    async fn test_wait_until_finished_reports_each_poll() {
        let (_, _, _, manager) = manager();
        let status = manager
            .start_export(&exporter(), ExportSource::from_chunks(["a", "b", "c"]))
            .await
            .unwrap();

        let mut seen = Vec::new();
        let done = manager
            .wait_until_finished_with(&status.id, Duration::from_millis(1), |s| {
                seen.push(s.status);
            })
            .await
            .unwrap();

        assert_eq!(seen.last(), Some(&done.status));
        assert!(seen[..seen.len() - 1].iter().all(|s| !s.is_finished()));
    }
}
