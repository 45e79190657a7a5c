//! Export command implementation.
//!
//! Runs one export in-process and follows its status until it finishes.

use crate::display::{print_status, status_spinner};
use anyhow::{Context, Result};
use hoard_lib::prelude::*;
use hoard_lib::TracingLog;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Options collected from the command line.
pub(crate) struct ExportOptions {
    pub(crate) file: PathBuf,
    pub(crate) user: String,
    pub(crate) permissions: Vec<String>,
    pub(crate) required_permission: String,
    pub(crate) redis_url: Option<String>,
    pub(crate) chunk_size: usize,
    pub(crate) poll_ms: u64,
    pub(crate) cancel_after_ms: Option<u64>,
    pub(crate) ttl_secs: u64,
    pub(crate) quiet: bool,
}

/// Export a file and wait for the job to finish.
pub(crate) async fn export(options: ExportOptions) -> Result<()> {
    if options.chunk_size == 0 {
        anyhow::bail!("--chunk-size must be greater than zero");
    }

    let cache_config = CacheConfig {
        redis_url: options.redis_url.clone(),
    };
    let cache = open_cache(&cache_config)
        .await
        .context("Failed to open cache")?;

    let deps = ExporterDependencies {
        log: Arc::new(TracingLog),
        config: ExporterConfig {
            required_permission: options.required_permission.clone(),
            ttl_secs: options.ttl_secs,
        },
        ..ExporterDependencies::new(Arc::clone(&cache))
    };
    let manager = ExportManager::new(deps);

    let file = tokio::fs::File::open(&options.file)
        .await
        .with_context(|| format!("Failed to open {}", options.file.display()))?;
    let source = ExportSource::from_reader_with_capacity(file, options.chunk_size);

    let user = User::new(options.user.as_str(), options.permissions.iter().map(String::as_str));
    let started = manager.start_export(&user, source).await?;
    let id = started.id.clone();

    if let Some(delay) = options.cancel_after_ms {
        let manager = manager.clone();
        let id = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            match manager.cancel_export(&id).await {
                Ok(status) => tracing::info!(%id, status = %status.status, "cancel requested"),
                Err(e) => tracing::warn!(%id, error = %e, "cancel rejected"),
            }
        });
    }

    let progress = status_spinner(options.quiet, &id)?;
    let interval = Duration::from_millis(options.poll_ms.max(1));
    let finished = manager
        .wait_until_finished_with(&id, interval, |status| {
            progress.set_message(format!("{} {}", status.id, status.status));
        })
        .await?;
    progress.finish_and_clear();

    let stored = cache
        .get(&data_key(&id))
        .await?
        .map_or(0, |data| data.len());

    if !options.quiet {
        print_status(&finished, stored);
    }
    Ok(())
}
