//! # Bus Publisher
//!
//! The publishing side of the state-event bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use crate::events::{EventFilter, StateEvent};
use crate::subscription::{BusSubscription, StateEventStream};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// In-process state-event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. One instance per binding engine; observers subscribe
/// with a filter and receive only matching events.
pub struct StateEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<StateEvent>,

    /// Active subscription count by filter description.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl StateEventBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Publish an event to every active subscriber.
    ///
    /// Returns the number of subscribers the event was delivered to.
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: StateEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> BusSubscription {
        let receiver = self.sender.subscribe();
        let filter_key = filter.describe();

        // Track subscription
        {
            if let Ok(mut subs) = self.subscriptions.write() {
                *subs.entry(filter_key.clone()).or_insert(0) += 1;
            }
        }

        debug!(filter = %filter_key, "new bus subscription");

        BusSubscription::new(receiver, filter, self.subscriptions.clone(), filter_key)
    }

    /// Get a `Stream` of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> StateEventStream {
        StateEventStream::new(self.subscribe(filter))
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published since creation.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// The channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for StateEventBus {
    fn default() -> Self {
        Self::new()
    }
}
