//! Cache backend abstraction.

use async_trait::async_trait;
use bytes::Bytes;
use hoard_types::CacheError;

/// Longest expiration a backend applies; larger TTLs are clamped to it.
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// The primitive operations a backend provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOp {
    /// Read a key.
    Get,
    /// Overwrite a key.
    Set,
    /// Append to a key, creating it if absent.
    Append,
    /// Set a key's time-to-live.
    Expire,
}

impl CacheOp {
    /// Returns the command name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Set => "SET",
            Self::Append => "APPEND",
            Self::Expire => "EXPIRE",
        }
    }
}

impl std::fmt::Display for CacheOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Asynchronous key-value store used to persist export jobs.
///
/// Every operation may fail with [`CacheError::Unavailable`]; callers get the
/// error unchanged and no retry happens at this layer.
#[async_trait]
pub trait Cache: Send + Sync + std::fmt::Debug {
    /// Reads `key`, returning `None` if it is absent or expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;

    /// Overwrites `key` with `value`, clearing any expiration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()>;

    /// Appends `value` to `key`, creating the key if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn append(&self, key: &str, value: &[u8]) -> CacheResult<()>;

    /// Expires `key` after `ttl_secs` seconds, at most [`MAX_TTL_SECS`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn expire(&self, key: &str, ttl_secs: u64) -> CacheResult<()>;

    /// Returns the remaining time-to-live of `key` in seconds.
    ///
    /// `None` if the key is absent or has no expiration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn ttl(&self, key: &str) -> CacheResult<Option<u64>>;
}
