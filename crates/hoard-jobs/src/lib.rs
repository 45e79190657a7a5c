//! Export job lifecycle for hoard.
//!
//! This crate streams caller-supplied bytes into a cache and tracks each
//! transfer until it completes or is cancelled:
//!
//! - [`ExportManager`] - Starts, queries and cancels exports
//! - [`CacheWriter`] - Persists chunks and keeps the status record current
//! - [`JobRegistry`] - In-flight transfers, keyed by job id
//! - [`ExportSource`] - The byte stream being exported
//! - [`PermissionChecker`], [`IdGenerator`], [`ExportLog`] - Collaborator seams

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hoard/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod collaborators;
mod config;
mod manager;
mod registry;
mod source;
mod transfer;
mod writer;

pub use collaborators::{
    ExportLog, IdGenerator, MemoryLog, PermissionChecker, SequenceIdGenerator, StaticPermissions,
    TracingLog, UuidGenerator,
};
pub use config::ExporterConfig;
pub use manager::{ExportManager, ExporterDependencies};
pub use registry::{JobHandle, JobRegistry, TransferControl};
pub use source::{DEFAULT_CHUNK_SIZE, ExportSource};
pub use writer::{CacheWriter, PumpEnd};
