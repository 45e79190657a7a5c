//! Error types for hoard.

use crate::{JobId, StatusKind};
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised by a cache backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store could not complete the request.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while starting, querying or cancelling exports.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The user lacks the permission required for exports.
    #[error("User '{user}' lacks permission '{permission}'")]
    PermissionDenied {
        /// The rejected user.
        user: String,
        /// The permission that was required.
        permission: String,
    },

    /// No status record exists for the id.
    #[error("No export found for id: {0}")]
    NotFound(JobId),

    /// The job's current state does not allow the operation.
    #[error("Export {id} is {status}")]
    InvalidState {
        /// The job id.
        id: JobId,
        /// Status the job was found in.
        status: StatusKind,
    },

    /// A cache operation failed.
    #[error(transparent)]
    CacheUnavailable(#[from] CacheError),

    /// A status record exists but could not be decoded.
    #[error("Corrupt status record for export {id}: {source}")]
    Decode {
        /// The job id.
        id: JobId,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize a status record.
    #[error("Failed to serialize status: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A handle for the id is already registered.
    #[error("Export {0} is already registered")]
    DuplicateJob(JobId),

    /// The source stream failed.
    #[error("Source stream error: {0}")]
    Source(#[from] std::io::Error),
}
