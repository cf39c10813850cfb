// ── Shared status cache ──
//
// Process-lifetime state shared by the poller, the command router, the
// companion bridge and any UI. Values are published through `watch`
// channels so readers get push-based change notification.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::trace;

use crate::model::{BlockingStatus, HostIdentity};
use crate::stream::StatusStream;

/// Identifies one signed-in stretch. Bumped every time the session is
/// retired; a write tagged with an older generation is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

/// Position of a status write in dispatch order.
///
/// Drawn from a counter rather than the wall clock, so a clock step
/// cannot reorder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Holds the cached [`BlockingStatus`] and [`HostIdentity`].
///
/// Status writes are crate-private and go through [`apply`](Self::apply),
/// which enforces the generation fence and ticket order.
pub struct StatusStore {
    generation: AtomicU64,
    issued: AtomicU64,
    applied: AtomicU64,
    status: watch::Sender<Option<BlockingStatus>>,
    host: watch::Sender<Option<HostIdentity>>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (status, _) = watch::channel(None);
        let (host, _) = watch::channel(None);
        Self {
            generation: AtomicU64::new(0),
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            status,
            host,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Latest cached status, if any poll or command has produced one.
    pub fn current(&self) -> Option<BlockingStatus> {
        *self.status.borrow()
    }

    /// Subscribe to status changes via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<Option<BlockingStatus>> {
        self.status.subscribe()
    }

    /// Subscribe to status changes as a [`StatusStream`].
    pub fn stream(&self) -> StatusStream {
        StatusStream::new(self.status.subscribe())
    }

    /// Hostname of the appliance from the latest sign-in.
    pub fn host(&self) -> Option<HostIdentity> {
        self.host.borrow().clone()
    }

    /// The current generation. Capture it before reading the session a
    /// response will be produced under.
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Reserve the next write position. Take it when the request is
    /// dispatched (polls) or accepted (commands).
    pub(crate) fn ticket(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Store `next` if it belongs to the current generation and its
    /// ticket is not older than the cached value's. `as_of` is clamped so
    /// it never moves backwards. Returns `true` when the cache changed.
    pub(crate) fn apply(
        &self,
        generation: Generation,
        ticket: Ticket,
        mut next: BlockingStatus,
    ) -> bool {
        self.status.send_if_modified(|slot| {
            if self.generation.load(Ordering::Acquire) != generation.0 {
                trace!(?generation, "dropping status from retired session");
                return false;
            }
            if ticket.0 < self.applied.load(Ordering::Acquire) {
                trace!(?ticket, "dropping status older than cache");
                return false;
            }
            self.applied.store(ticket.0, Ordering::Release);
            if let Some(prev) = *slot {
                next.as_of = next.as_of.max(prev.as_of);
            }
            let changed = *slot != Some(next);
            *slot = Some(next);
            changed
        })
    }

    /// Retire the current generation. Any write still in flight for it
    /// will be dropped.
    pub(crate) fn invalidate(&self) {
        // Bumped under the watch lock so it serializes with `apply`.
        self.status.send_if_modified(|_| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            false
        });
    }

    pub(crate) fn set_host(&self, host: Option<HostIdentity>) {
        self.host.send_replace(host);
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
