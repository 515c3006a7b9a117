//! # State Store
//!
//! The destination state model: one slot, ring buffer, or expiring set
//! per declared member, created with the binding table and mutated
//! only by the router.
//!
//! Readers never get references into the store — scalars and history
//! snapshots are clones, so observation from another execution context
//! cannot race the single mutation path.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;

use tagbind_collections::{ExpiringSet, OccurrenceId, RingBuffer, RingEvent, SetEvent};
use tagbind_types::{ConfigurationError, DataValue, MemberId};

use crate::domain::binding::{BindingTable, DestinationKind};

/// The engine's destination state.
///
/// Exclusively owned by the engine; the presentation layer reaches it
/// through snapshot and subscribe methods only.
pub struct StateStore {
    /// Latest reading per scalar member; absent until first delivery.
    scalars: RwLock<HashMap<MemberId, DataValue>>,

    /// Bounded histories, one writer lock per member.
    histories: HashMap<MemberId, RwLock<RingBuffer<DataValue>>>,

    /// Expiring event sets; internally serialized.
    events: HashMap<MemberId, ExpiringSet<DataValue>>,
}

impl StateStore {
    /// Create the destinations a table declares.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroCapacity`] if a zero-capacity
    /// history survived table validation (it cannot, but the invariant
    /// is re-checked rather than assumed).
    pub(crate) fn from_table(table: &BindingTable) -> Result<Self, ConfigurationError> {
        let mut histories = HashMap::new();
        let mut events = HashMap::new();

        for entry in table.entries() {
            match &entry.destination {
                DestinationKind::Scalar => {}
                DestinationKind::BoundedHistory { capacity } => {
                    let capacity = NonZeroUsize::new(*capacity).ok_or_else(|| {
                        ConfigurationError::ZeroCapacity {
                            member: entry.member.to_string(),
                        }
                    })?;
                    histories.insert(entry.member.clone(), RwLock::new(RingBuffer::new(capacity)));
                }
                DestinationKind::ExpiringEvents { queue_depth, .. } => {
                    let set = match (*queue_depth).and_then(NonZeroUsize::new) {
                        Some(limit) => ExpiringSet::with_depth_limit(limit),
                        None => ExpiringSet::new(),
                    };
                    events.insert(entry.member.clone(), set);
                }
            }
        }

        Ok(Self {
            scalars: RwLock::new(HashMap::new()),
            histories,
            events,
        })
    }

    // -------------------------------------------------------------------
    // Mutation (router only)
    // -------------------------------------------------------------------

    /// Overwrite a scalar member.
    ///
    /// Returns `true` when the stored reading changed (by value and
    /// status; timestamps do not defeat coalescing).
    pub(crate) fn set_scalar(&self, member: &MemberId, value: DataValue) -> bool {
        let mut scalars = self
            .scalars
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match scalars.get(member) {
            Some(current) if current.same_reading(&value) => {
                // Redundant delivery; keep the existing reading.
                false
            }
            _ => {
                scalars.insert(member.clone(), value);
                true
            }
        }
    }

    /// Push into a bounded history, returning the evicted reading when
    /// the buffer was full.
    pub(crate) fn push_history(&self, member: &MemberId, value: DataValue) -> Option<DataValue> {
        let ring = self.histories.get(member)?;
        ring.write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value)
    }

    /// Insert an occurrence into an expiring event set.
    pub(crate) fn insert_event(&self, member: &MemberId, value: DataValue, ttl: Duration) {
        if let Some(set) = self.events.get(member) {
            set.insert(value, ttl);
        }
    }

    /// Cancel every pending event expiry. Called on engine shutdown.
    pub(crate) fn close(&self) {
        for set in self.events.values() {
            set.close();
        }
    }

    // -------------------------------------------------------------------
    // Observation (presentation layer)
    // -------------------------------------------------------------------

    /// Latest reading of a scalar member, if one has been delivered.
    #[must_use]
    pub fn scalar(&self, member: &MemberId) -> Option<DataValue> {
        self.scalars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member)
            .cloned()
    }

    /// Snapshot of a bounded history, oldest first.
    #[must_use]
    pub fn history_snapshot(&self, member: &MemberId) -> Option<Vec<DataValue>> {
        let ring = self.histories.get(member)?;
        Some(
            ring.read()
                .unwrap_or_else(PoisonError::into_inner)
                .snapshot(),
        )
    }

    /// Subscribe to a bounded history's change events.
    #[must_use]
    pub fn subscribe_history(
        &self,
        member: &MemberId,
    ) -> Option<broadcast::Receiver<RingEvent<DataValue>>> {
        let ring = self.histories.get(member)?;
        Some(
            ring.read()
                .unwrap_or_else(PoisonError::into_inner)
                .subscribe(),
        )
    }

    /// Insertion-ordered snapshot of a member's live event
    /// occurrences.
    #[must_use]
    pub fn live_events(&self, member: &MemberId) -> Option<Vec<(OccurrenceId, DataValue)>> {
        self.events.get(member).map(ExpiringSet::live)
    }

    /// Subscribe to a member's event add/expire/evict notifications.
    #[must_use]
    pub fn subscribe_events(
        &self,
        member: &MemberId,
    ) -> Option<broadcast::Receiver<SetEvent<DataValue>>> {
        self.events.get(member).map(ExpiringSet::subscribe)
    }
}
