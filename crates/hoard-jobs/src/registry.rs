//! In-memory registry of jobs that are still streaming.
//!
//! Removing a handle is the linearization point for a job's terminal status:
//! the caller that gets the handle back writes COMPLETE or CANCELLED, every
//! other caller sees the job as already settled. A settled job whose terminal
//! write failed stays marked as unwritten until one caller takes over the
//! write.

use hoard_types::{ExportError, JobId, Result, StatusKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Handle to an active transfer, owned by the [`JobRegistry`].
///
/// The writer side is stopped through a cancellation token; the reader side
/// reports through a one-shot channel once the source stream has been
/// dropped.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    cancel: CancellationToken,
    released: oneshot::Receiver<()>,
}

/// The transfer task's half of a [`JobHandle`].
#[derive(Debug)]
pub struct TransferControl {
    cancel: CancellationToken,
    released: oneshot::Sender<()>,
}

impl TransferControl {
    /// Token that fires when the job is cancelled.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Reports that the source stream has been dropped.
    pub fn release(self) {
        // The handle may already be gone if the transfer settled itself.
        let _ = self.released.send(());
    }
}

impl JobHandle {
    /// Creates a handle for job `id` and the control half for its transfer.
    #[must_use]
    pub fn new(id: JobId) -> (Self, TransferControl) {
        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let handle = Self {
            id,
            cancel: cancel.clone(),
            released: rx,
        };
        (
            handle,
            TransferControl {
                cancel,
                released: tx,
            },
        )
    }

    /// Returns the job id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stops the transfer and waits until its source has been released.
    ///
    /// Resolves as soon as the transfer task drops its [`TransferControl`],
    /// whether it released explicitly or exited early.
    pub async fn terminate(self) {
        self.cancel.cancel();
        let _ = self.released.await;
    }
}

#[derive(Debug)]
struct Settled {
    status: StatusKind,
    at: Instant,
    unwritten: bool,
}

impl Settled {
    fn new(status: StatusKind) -> Self {
        Self {
            status,
            at: Instant::now(),
            unwritten: false,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    active: HashMap<JobId, JobHandle>,
    settled: HashMap<JobId, Settled>,
}

/// Maps job ids to the handles of transfers running in this process.
///
/// Not durable: after a restart no job can be cancelled. Outcomes of settled
/// jobs are remembered for `retention` so that a caller losing the removal
/// race can report what the winner decided.
#[derive(Debug)]
pub struct JobRegistry {
    inner: Mutex<Inner>,
    retention: Duration,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    /// Default retention of settled outcomes (one hour).
    pub const DEFAULT_RETENTION: Duration = Duration::from_secs(hoard_types::EXPORT_TTL_SECS);

    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(Self::DEFAULT_RETENTION)
    }

    /// Creates an empty registry that remembers settled outcomes for `retention`.
    #[must_use]
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            retention,
        }
    }

    /// Registers `handle` under its id.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::DuplicateJob`] if the id is already active.
    pub fn put(&self, handle: JobHandle) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.active.contains_key(&handle.id) {
            return Err(ExportError::DuplicateJob(handle.id));
        }
        inner.settled.remove(&handle.id);
        inner.active.insert(handle.id.clone(), handle);
        Ok(())
    }

    /// Returns true if a transfer for `id` is still registered.
    #[must_use]
    pub fn get(&self, id: &str) -> bool {
        self.inner.lock().active.contains_key(id)
    }

    /// Removes the handle for `id`, settling the job on `outcome`.
    ///
    /// Returns `None` if another caller already removed it; that caller owns
    /// the terminal status write.
    pub fn remove(&self, id: &str, outcome: StatusKind) -> Option<JobHandle> {
        let mut inner = self.inner.lock();
        let handle = inner.active.remove(id)?;

        let retention = self.retention;
        inner
            .settled
            .retain(|_, settled| settled.unwritten || settled.at.elapsed() < retention);
        inner
            .settled
            .insert(handle.id.clone(), Settled::new(outcome));
        Some(handle)
    }

    /// Replaces the outcome of an already removed job.
    ///
    /// Used when the winner of the removal has to write a different terminal
    /// status than the one it settled on.
    pub fn settle(&self, id: &str, outcome: StatusKind) {
        self.inner
            .lock()
            .settled
            .insert(id.to_string(), Settled::new(outcome));
    }

    /// Records that the terminal write for `id` failed and is still owed.
    ///
    /// The entry is kept regardless of retention until
    /// [`JobRegistry::take_unwritten`] claims it.
    pub fn record_unwritten(&self, id: &str, outcome: StatusKind) {
        let mut settled = Settled::new(outcome);
        settled.unwritten = true;
        self.inner.lock().settled.insert(id.to_string(), settled);
    }

    /// Claims the owed terminal write for `id`, if any.
    ///
    /// At most one caller gets `Some`; it must write the returned status
    /// (or record it as unwritten again).
    pub fn take_unwritten(&self, id: &str) -> Option<StatusKind> {
        let mut inner = self.inner.lock();
        let settled = inner.settled.get_mut(id).filter(|s| s.unwritten)?;
        settled.unwritten = false;
        settled.at = Instant::now();
        Some(settled.status)
    }

    /// Returns the outcome a removed job was settled on, if still retained.
    #[must_use]
    pub fn settled(&self, id: &str) -> Option<StatusKind> {
        let inner = self.inner.lock();
        inner
            .settled
            .get(id)
            .filter(|settled| settled.at.elapsed() < self.retention)
            .map(|settled| settled.status)
    }

    /// Returns the number of registered transfers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Returns true if no transfer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
