//! Export status command.

use crate::display::print_status;
use anyhow::{Context, Result};
use hoard_lib::ExportStore;
use hoard_lib::prelude::*;

/// Look up the stored status of export `id`.
pub(crate) async fn status(id: &str, redis_url: Option<String>) -> Result<()> {
    let Some(url) = redis_url else {
        anyhow::bail!(
            "Exports only outlive the process in Redis; pass --redis-url or set HOARD_REDIS_URL"
        );
    };

    let cache = open_cache(&CacheConfig::redis(url))
        .await
        .context("Failed to open cache")?;
    let store = ExportStore::new(cache);

    let status = store.status(id).await?;
    let stored = store
        .cache()
        .get(&data_key(id))
        .await?
        .map_or(0, |data| data.len());

    print_status(&status, stored);
    Ok(())
}
