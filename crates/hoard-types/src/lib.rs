//! Core types for hoard cache-backed export jobs.
//!
//! This crate provides the fundamental data structures used throughout hoard:
//!
//! - [`ExportStatus`] - The status record persisted for every export job
//! - [`StatusKind`] - Lifecycle state of a job
//! - [`User`] - The caller requesting an export
//! - [`ExportError`] - Errors surfaced by export operations
//! - [`CacheError`] - Errors raised by cache backends

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hoard/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod status;
mod user;

pub use error::{CacheError, ExportError, Result};
pub use status::{EXPORT_TTL_SECS, ExportStatus, JobId, StatusKind, data_key};
pub use user::User;
