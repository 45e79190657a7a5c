//! Export status records and lifecycle states.

use serde::{Deserialize, Serialize};

/// Unique identifier for an export job.
///
/// Doubles as the cache key of the job's status record.
pub type JobId = String;

/// Expiration applied to both keys of a job once it reaches a terminal state.
pub const EXPORT_TTL_SECS: u64 = 60 * 60;

/// Returns the cache key holding the accumulated export bytes for `id`.
#[must_use]
pub fn data_key(id: &str) -> String {
    format!("{id}-data")
}

/// Lifecycle state of an export job.
///
/// `Created -> Pending -> Complete`, or `Created | Pending -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusKind {
    /// Job registered; no chunk persisted yet.
    Created,
    /// At least one chunk has been persisted.
    Pending,
    /// The source stream ended and every chunk was persisted.
    Complete,
    /// The job was cancelled or its transfer failed.
    #[serde(alias = "CANCELED")]
    Cancelled,
}

impl StatusKind {
    /// Returns true if no further transition is allowed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }

    /// Returns true if a job in this state may move to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Created, Self::Pending | Self::Complete | Self::Cancelled) => true,
            (Self::Pending, Self::Pending | Self::Complete | Self::Cancelled) => true,
            _ => false,
        }
    }

    /// Returns the status as it is written to the cache.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Pending => "PENDING",
            Self::Complete => "COMPLETE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status record stored under a job's id.
///
/// Serialized as `{"status":"PENDING","id":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStatus {
    /// Current lifecycle state.
    pub status: StatusKind,
    /// The job this record belongs to.
    pub id: JobId,
}

impl ExportStatus {
    /// Creates a status record.
    #[must_use]
    pub const fn new(id: JobId, status: StatusKind) -> Self {
        Self { status, id }
    }

    /// Record written when a job is registered.
    #[must_use]
    pub const fn created(id: JobId) -> Self {
        Self::new(id, StatusKind::Created)
    }

    /// Record written after each persisted chunk.
    #[must_use]
    pub const fn pending(id: JobId) -> Self {
        Self::new(id, StatusKind::Pending)
    }

    /// Record written when the source stream ends.
    #[must_use]
    pub const fn complete(id: JobId) -> Self {
        Self::new(id, StatusKind::Complete)
    }

    /// Record written when a job is cancelled.
    #[must_use]
    pub const fn cancelled(id: JobId) -> Self {
        Self::new(id, StatusKind::Cancelled)
    }

    /// Returns true if the job is in a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Cache key of the job's data blob.
    #[must_use]
    pub fn data_key(&self) -> String {
        data_key(&self.id)
    }

    /// Encodes the record as stored in the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a record read from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a valid status record.
    pub fn from_json(raw: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(raw)
    }
}
