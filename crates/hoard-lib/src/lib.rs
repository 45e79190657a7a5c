//! Stream byte sources into a cache as cancellable export jobs.
//!
//! This is a facade crate that re-exports functionality from the hoard
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use hoard_lib::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = open_cache(&CacheConfig::default()).await?;
//!     let manager = ExportManager::new(ExporterDependencies::new(cache));
//!
//!     let user = User::new("42", ["exporter"]);
//!     let source = ExportSource::from_file("report.csv").await?;
//!     let status = manager.start_export(&user, source).await?;
//!
//!     let done = manager
//!         .wait_until_finished(&status.id, Duration::from_millis(100))
//!         .await?;
//!     println!("{} is {}", done.id, done.status);
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hoard/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hoard_types::*;

// Re-export cache adapters
pub use hoard_cache::{
    Cache, CacheConfig, CacheOp, CacheResult, CacheWrite, ExportStore, MAX_TTL_SECS, MemoryCache,
    open_cache,
};

#[cfg(feature = "redis")]
pub use hoard_cache::RedisCache;

// Re-export the job lifecycle
pub use hoard_jobs::{
    CacheWriter, DEFAULT_CHUNK_SIZE, ExportLog, ExportManager, ExportSource, ExporterConfig,
    ExporterDependencies, IdGenerator, JobHandle, JobRegistry, MemoryLog, PermissionChecker,
    PumpEnd, SequenceIdGenerator, StaticPermissions, TracingLog, TransferControl, UuidGenerator,
};

/// Prelude module for convenient imports.
///
/// ```
/// use hoard_lib::prelude::*;
/// ```
pub mod prelude {
    pub use hoard_types::{
        ExportError, ExportStatus, JobId, Result, StatusKind, User, data_key,
    };

    pub use hoard_cache::{Cache, CacheConfig, MemoryCache, open_cache};

    #[cfg(feature = "redis")]
    pub use hoard_cache::RedisCache;

    pub use hoard_jobs::{
        ExportManager, ExportSource, ExporterConfig, ExporterDependencies, JobRegistry,
    };
}
