//! Cache adapters for hoard export jobs.
//!
//! This crate provides the storage layer beneath export jobs:
//!
//! - [`Cache`] - Asynchronous GET/SET/APPEND/EXPIRE primitives
//! - [`MemoryCache`] - In-process store with Redis-like expiration semantics
//! - [`RedisCache`] - Redis-backed store (requires the `redis` feature)
//! - [`ExportStore`] - Typed status and data access over any [`Cache`]
//! - [`CacheConfig`] - Backend selection

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hoard/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod backend;
mod config;
mod memory;
#[cfg(feature = "redis")]
mod remote;
mod store;

pub use backend::{Cache, CacheOp, CacheResult, MAX_TTL_SECS};
pub use config::{CacheConfig, open_cache};
pub use memory::{CacheWrite, MemoryCache};
#[cfg(feature = "redis")]
pub use remote::RedisCache;
pub use store::ExportStore;

pub use hoard_types::CacheError;
