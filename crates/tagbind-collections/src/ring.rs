//! # Ring Buffer
//!
//! Fixed-capacity, insertion-ordered history. When full, a push evicts
//! the logically oldest element before appending. Observers receive
//! one `Evicted` (when eviction occurred) and one `Pushed` event per
//! push, both sent before `push` returns.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use tokio::sync::broadcast;

use crate::EVENT_CHANNEL_CAPACITY;

/// Change notification emitted by a [`RingBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RingEvent<T> {
    /// An element was appended.
    Pushed(T),
    /// The oldest element was evicted to make room.
    Evicted(T),
}

/// Fixed-capacity FIFO history with overwrite-oldest eviction.
///
/// Capacity is set at construction and never grows; `NonZeroUsize`
/// makes the zero-capacity configuration unrepresentable here — the
/// binding table reports it as a configuration error before any buffer
/// is built.
///
/// # Concurrency
///
/// Mutation requires `&mut self` (single-writer discipline); readers
/// take [`snapshot`](RingBuffer::snapshot) copies or observe the
/// broadcast channel from [`subscribe`](RingBuffer::subscribe).
#[derive(Debug)]
pub struct RingBuffer<T> {
    /// Stored elements, oldest first.
    items: VecDeque<T>,

    /// Fixed capacity.
    capacity: NonZeroUsize,

    /// Change-event fan-out.
    events: broadcast::Sender<RingEvent<T>>,
}

impl<T: Clone> RingBuffer<T> {
    /// Create an empty buffer with the given fixed capacity.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            items: VecDeque::with_capacity(capacity.get()),
            capacity,
            events,
        }
    }

    /// Append an element, evicting the oldest when full.
    ///
    /// Returns the evicted element, if any. Both change events are
    /// sent before this method returns; sends to a channel with no
    /// subscribers are no-ops.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity.get() {
            self.items.pop_front()
        } else {
            None
        };

        if let Some(old) = &evicted {
            let _ = self.events.send(RingEvent::Evicted(old.clone()));
        }

        self.items.push_back(item.clone());
        let _ = self.events.send(RingEvent::Pushed(item));

        evicted
    }

    /// Copy of the current contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// Subscribe to change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RingEvent<T>> {
        self.events.subscribe()
    }

    /// Number of stored elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no elements are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}
