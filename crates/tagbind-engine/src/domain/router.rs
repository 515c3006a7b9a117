//! # Notification Router
//!
//! Resolves inbound value-change notifications through the binding
//! table and applies the destination kind's update strategy. The
//! router is the single mutation path into the state store; `route`
//! does no I/O and never awaits, so the arrival path is never blocked
//! by slow consumers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

use tagbind_bus::{StateEvent, StateEventBus};
use tagbind_types::ValueNotification;

use crate::domain::binding::{BindingTable, DestinationKind};
use crate::domain::state::StateStore;

/// Atomic counters for monitoring the router.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Total notifications handed to `route`.
    pub notifications_routed: AtomicU64,
    /// Scalar overwrites that changed the stored reading.
    pub scalar_updates: AtomicU64,
    /// Scalar deliveries coalesced as redundant.
    pub scalar_coalesced: AtomicU64,
    /// Pushes into bounded histories.
    pub history_pushes: AtomicU64,
    /// Occurrences inserted into event sets.
    pub events_raised: AtomicU64,
    /// Notifications dropped for having no binding entry.
    pub unbound_dropped: AtomicU64,
}

impl RouterMetrics {
    /// Total notifications handed to `route`.
    #[must_use]
    pub fn notifications_routed(&self) -> u64 {
        self.notifications_routed.load(Ordering::Relaxed)
    }

    /// Scalar overwrites that changed the stored reading.
    #[must_use]
    pub fn scalar_updates(&self) -> u64 {
        self.scalar_updates.load(Ordering::Relaxed)
    }

    /// Scalar deliveries coalesced as redundant.
    #[must_use]
    pub fn scalar_coalesced(&self) -> u64 {
        self.scalar_coalesced.load(Ordering::Relaxed)
    }

    /// Pushes into bounded histories.
    #[must_use]
    pub fn history_pushes(&self) -> u64 {
        self.history_pushes.load(Ordering::Relaxed)
    }

    /// Occurrences inserted into event sets.
    #[must_use]
    pub fn events_raised(&self) -> u64 {
        self.events_raised.load(Ordering::Relaxed)
    }

    /// Notifications dropped for having no binding entry.
    #[must_use]
    pub fn unbound_dropped(&self) -> u64 {
        self.unbound_dropped.load(Ordering::Relaxed)
    }
}

/// Applies notifications to the state store per the binding table.
pub struct NotificationRouter {
    table: Arc<BindingTable>,
    store: Arc<StateStore>,
    bus: Arc<StateEventBus>,
    metrics: RouterMetrics,
}

impl NotificationRouter {
    /// Create a router over a table, store, and bus.
    #[must_use]
    pub fn new(table: Arc<BindingTable>, store: Arc<StateStore>, bus: Arc<StateEventBus>) -> Self {
        Self {
            table,
            store,
            bus,
            metrics: RouterMetrics::default(),
        }
    }

    /// Apply one notification.
    ///
    /// An address with no binding entry is dropped silently — the
    /// table only declares interesting addresses. Error statuses are
    /// delivered to the destination unchanged; status is part of the
    /// value.
    pub fn route(&self, notification: ValueNotification) {
        self.metrics
            .notifications_routed
            .fetch_add(1, Ordering::Relaxed);

        let Some(entry) = self.table.lookup(&notification.address) else {
            self.metrics.unbound_dropped.fetch_add(1, Ordering::Relaxed);
            trace!(address = %notification.address, "notification for unbound address dropped");
            return;
        };

        match &entry.destination {
            DestinationKind::Scalar => {
                let changed = self.store.set_scalar(&entry.member, notification.value.clone());
                if changed {
                    self.metrics.scalar_updates.fetch_add(1, Ordering::Relaxed);
                    self.bus.publish(StateEvent::ScalarChanged {
                        member: entry.member.clone(),
                        value: notification.value,
                    });
                } else {
                    self.metrics
                        .scalar_coalesced
                        .fetch_add(1, Ordering::Relaxed);
                }
            }
            DestinationKind::BoundedHistory { .. } => {
                self.store.push_history(&entry.member, notification.value);
                self.metrics.history_pushes.fetch_add(1, Ordering::Relaxed);
                self.bus.publish(StateEvent::HistoryAppended {
                    member: entry.member.clone(),
                });
            }
            DestinationKind::ExpiringEvents { ttl, .. } => {
                self.store
                    .insert_event(&entry.member, notification.value, *ttl);
                self.metrics.events_raised.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// The router's counters.
    #[must_use]
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// The table this router resolves against.
    #[must_use]
    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    /// The store this router mutates.
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }
}
