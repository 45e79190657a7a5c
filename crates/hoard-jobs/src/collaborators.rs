//! Services the export manager consumes: permission checks, id generation
//! and a log sink.

use async_trait::async_trait;
use hoard_types::User;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Decides whether a user holds a permission.
#[async_trait]
pub trait PermissionChecker: Send + Sync + std::fmt::Debug {
    /// Returns true if `user` is granted `permission`.
    async fn check_permission(&self, user: &User, permission: &str) -> bool;
}

/// Grants exactly the permissions listed on the [`User`] itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPermissions;

#[async_trait]
impl PermissionChecker for StaticPermissions {
    async fn check_permission(&self, user: &User, permission: &str) -> bool {
        user.has_permission(permission)
    }
}

/// Supplies job identifiers.
///
/// Ids must be unique across all jobs active at the same time.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    /// Returns a fresh identifier.
    fn new_id(&self) -> String;
}

/// Generates random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Generates `"{prefix}-{n}"` with `n` counting up from 1.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceIdGenerator {
    /// Creates a generator for ids starting with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }

    /// Returns how many ids have been handed out.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst) - 1
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{n}", self.prefix)
    }
}

/// Fire-and-forget sink for lifecycle messages.
pub trait ExportLog: Send + Sync + std::fmt::Debug {
    /// Records `message`.
    fn log(&self, message: &str);
}

/// Forwards messages to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ExportLog for TracingLog {
    fn log(&self, message: &str) {
        tracing::info!(target: "hoard::export", "{message}");
    }
}

/// Keeps messages in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<String>>,
}

impl MemoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Returns true if any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(needle))
    }
}

impl ExportLog for MemoryLog {
    fn log(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
