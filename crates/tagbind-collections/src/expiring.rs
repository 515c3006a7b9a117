//! # Expiring Set
//!
//! Insertion-ordered multiset of occurrences, each scheduled for
//! automatic removal a fixed time-to-live after its insertion.
//! Identical items are distinct occurrences; nothing is de-duplicated
//! and each occurrence expires independently.
//!
//! Removal fires on the Tokio timer wheel, not on the caller's path;
//! firing is serialized against concurrent inserts by the set's
//! internal lock. Tearing the set down cancels every pending removal
//! without emitting spurious notifications.

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::EVENT_CHANNEL_CAPACITY;

/// Identity of one inserted occurrence.
///
/// Monotonically assigned per set; identical items inserted twice get
/// distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OccurrenceId(pub u64);

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "occ-{}", self.0)
    }
}

/// Change notification emitted by an [`ExpiringSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum SetEvent<T> {
    /// An occurrence was inserted.
    Added {
        /// Identity of the occurrence.
        id: OccurrenceId,
        /// The inserted item.
        item: T,
    },
    /// An occurrence's time-to-live elapsed.
    Expired {
        /// Identity of the occurrence.
        id: OccurrenceId,
        /// The removed item.
        item: T,
    },
    /// An occurrence was evicted early by the depth limit.
    Evicted {
        /// Identity of the occurrence.
        id: OccurrenceId,
        /// The removed item.
        item: T,
    },
}

/// One live occurrence plus the handle to its pending removal task.
struct Entry<T> {
    id: OccurrenceId,
    item: T,
    abort: AbortHandle,
}

/// State shared between the set handle and its removal tasks.
struct Inner<T> {
    /// Live occurrences, insertion order.
    entries: VecDeque<Entry<T>>,
    /// Next occurrence id.
    next_id: u64,
    /// Set once the set is torn down; removal tasks observing this
    /// exit without firing.
    closed: bool,
}

fn lock_inner<T>(inner: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Insertion-ordered occurrence set with per-entry time-to-live.
///
/// # Runtime
///
/// [`insert`](ExpiringSet::insert) spawns the deferred removal task
/// and must therefore be called from within a Tokio runtime.
pub struct ExpiringSet<T> {
    inner: Arc<Mutex<Inner<T>>>,
    events: broadcast::Sender<SetEvent<T>>,
    depth_limit: Option<NonZeroUsize>,
}

impl<T: Clone + Send + 'static> ExpiringSet<T> {
    /// Create an unbounded set.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a set that evicts its oldest live occurrence whenever an
    /// insert would exceed `limit`.
    #[must_use]
    pub fn with_depth_limit(limit: NonZeroUsize) -> Self {
        Self::build(Some(limit))
    }

    fn build(depth_limit: Option<NonZeroUsize>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: VecDeque::new(),
                next_id: 0,
                closed: false,
            })),
            events,
            depth_limit,
        }
    }

    /// Insert an occurrence and schedule its removal after `ttl`,
    /// measured from now.
    ///
    /// Emits `Added` synchronously (and `Evicted` for any occurrence
    /// displaced by the depth limit). Never blocks. Inserting into a
    /// closed set is a no-op; the returned id names no live
    /// occurrence.
    pub fn insert(&self, item: T, ttl: Duration) -> OccurrenceId {
        let mut displaced = Vec::new();

        let id = {
            let mut inner = lock_inner(&self.inner);

            let id = OccurrenceId(inner.next_id);
            inner.next_id += 1;

            if inner.closed {
                return id;
            }

            if let Some(limit) = self.depth_limit {
                while inner.entries.len() >= limit.get() {
                    if let Some(old) = inner.entries.pop_front() {
                        old.abort.abort();
                        displaced.push((old.id, old.item));
                    }
                }
            }

            let weak = Arc::downgrade(&self.inner);
            let events = self.events.clone();
            let task = tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let expired = {
                    let mut guard = lock_inner(&inner);
                    if guard.closed {
                        return;
                    }
                    guard
                        .entries
                        .iter()
                        .position(|entry| entry.id == id)
                        .and_then(|pos| guard.entries.remove(pos))
                };
                if let Some(entry) = expired {
                    let _ = events.send(SetEvent::Expired {
                        id: entry.id,
                        item: entry.item,
                    });
                }
            });

            inner.entries.push_back(Entry {
                id,
                item: item.clone(),
                abort: task.abort_handle(),
            });

            id
        };

        for (old_id, old_item) in displaced {
            let _ = self.events.send(SetEvent::Evicted {
                id: old_id,
                item: old_item,
            });
        }
        let _ = self.events.send(SetEvent::Added { id, item });

        id
    }

    /// Cancel every pending removal and mark the set closed.
    ///
    /// No notifications fire for cancelled removals. Called implicitly
    /// on drop.
    pub fn close(&self) {
        let drained: Vec<AbortHandle> = {
            let mut inner = lock_inner(&self.inner);
            inner.closed = true;
            inner.entries.drain(..).map(|entry| entry.abort).collect()
        };
        if !drained.is_empty() {
            debug!(cancelled = drained.len(), "expiring set closed");
        }
        for abort in drained {
            abort.abort();
        }
    }

    /// Insertion-ordered snapshot of the live occurrences.
    #[must_use]
    pub fn live(&self) -> Vec<(OccurrenceId, T)> {
        lock_inner(&self.inner)
            .entries
            .iter()
            .map(|entry| (entry.id, entry.item.clone()))
            .collect()
    }

    /// Number of live occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_inner(&self.inner).entries.len()
    }

    /// True when no occurrences are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to add/expire/evict events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SetEvent<T>> {
        self.events.subscribe()
    }

    /// The configured depth limit, if any.
    #[must_use]
    pub fn depth_limit(&self) -> Option<usize> {
        self.depth_limit.map(NonZeroUsize::get)
    }
}

impl<T: Clone + Send + 'static> Default for ExpiringSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ExpiringSet<T> {
    fn drop(&mut self) {
        let mut inner = lock_inner(&self.inner);
        inner.closed = true;
        for entry in inner.entries.drain(..) {
            entry.abort.abort();
        }
    }
}
