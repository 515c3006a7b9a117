//! # Binding Table
//!
//! The declarative description of how addressed telemetry items map
//! onto state members, and the validated, immutable table the router
//! resolves notifications against.
//!
//! A [`BindingModel`] is declared once, builder-style; [`BindingTable::build`]
//! validates it and freezes it. Validation failures are programmer
//! errors — fatal at construction, never retried.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tagbind_types::{
    AttributeSelector, ConfigurationError, IndexRange, ItemAddress, MemberId, NodeAddress,
};

/// Delivery queue depth requested for event-notifier items when the
/// declaration does not name one.
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 8;

/// Queue depth requested for data items (latest value only matters;
/// histories replay on the engine side).
const DATA_QUEUE_DEPTH: usize = 1;

/// What makes the transport report a data change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeTrigger {
    /// Report when status or value changes.
    #[default]
    StatusValue,
    /// Report when status, value, or source timestamp changes.
    StatusValueTimestamp,
}

/// Update strategy applied at the destination member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationKind {
    /// Overwrite a single reading; redundant deliveries coalesce.
    Scalar,
    /// Keep the most recent `capacity` readings, oldest evicted first.
    BoundedHistory {
        /// Fixed history capacity; must be greater than zero.
        capacity: usize,
    },
    /// Hold each delivered occurrence for `ttl`, then drop it.
    ExpiringEvents {
        /// Time each occurrence stays live; must be greater than zero.
        ttl: Duration,
        /// Optional cap on concurrently live occurrences; the oldest
        /// is evicted when an insert would exceed it. Also the
        /// delivery queue depth requested from the transport.
        queue_depth: Option<usize>,
    },
}

/// One validated binding: an addressed item, its change trigger, and
/// its destination member. Immutable once the table is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    /// Destination member name.
    pub member: MemberId,
    /// The addressed item this member is fed from.
    pub address: ItemAddress,
    /// Transport-side change trigger for this item.
    pub trigger: ChangeTrigger,
    /// Update strategy at the destination.
    pub destination: DestinationKind,
}

/// Subscription-level configuration, immutable once set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSpec {
    /// Endpoint the transport connects to.
    pub endpoint_url: String,
    /// Server-side publishing interval.
    pub publishing_interval: Duration,
    /// Keep-alive count forwarded to the transport.
    pub keep_alive_count: u32,
}

/// One interest registration handed to the transport on establish:
/// derived from a binding entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredInterest {
    /// The item to monitor.
    pub address: ItemAddress,
    /// Change trigger for the item.
    pub trigger: ChangeTrigger,
    /// Server-side delivery queue depth.
    pub queue_depth: usize,
}

/// A raw member declaration, unvalidated.
#[derive(Debug, Clone)]
struct Declaration {
    member: String,
    node: String,
    attribute: AttributeSelector,
    index_range: Option<String>,
    trigger: ChangeTrigger,
    destination: DestinationKind,
}

/// Builder-style declarative description of a state model.
///
/// Declares the subscription configuration and every bound member.
/// Nothing is validated until [`BindingTable::build`].
#[derive(Debug, Clone)]
pub struct BindingModel {
    subscription: SubscriptionSpec,
    declarations: Vec<Declaration>,
}

impl BindingModel {
    /// Start a model for the given subscription configuration.
    #[must_use]
    pub fn new(
        endpoint_url: impl Into<String>,
        publishing_interval: Duration,
        keep_alive_count: u32,
    ) -> Self {
        Self {
            subscription: SubscriptionSpec {
                endpoint_url: endpoint_url.into(),
                publishing_interval,
                keep_alive_count,
            },
            declarations: Vec::new(),
        }
    }

    /// Declare a scalar member fed from a node's value attribute.
    #[must_use]
    pub fn scalar(self, member: impl Into<String>, node: impl Into<String>) -> Self {
        self.scalar_with_trigger(member, node, ChangeTrigger::default())
    }

    /// Declare a scalar member with an explicit change trigger.
    #[must_use]
    pub fn scalar_with_trigger(
        mut self,
        member: impl Into<String>,
        node: impl Into<String>,
        trigger: ChangeTrigger,
    ) -> Self {
        self.declarations.push(Declaration {
            member: member.into(),
            node: node.into(),
            attribute: AttributeSelector::Value,
            index_range: None,
            trigger,
            destination: DestinationKind::Scalar,
        });
        self
    }

    /// Declare a bounded-history member fed from a node's value
    /// attribute.
    #[must_use]
    pub fn history(
        self,
        member: impl Into<String>,
        node: impl Into<String>,
        capacity: usize,
    ) -> Self {
        self.history_with_trigger(member, node, capacity, ChangeTrigger::StatusValueTimestamp)
    }

    /// Declare a bounded-history member with an explicit change
    /// trigger.
    #[must_use]
    pub fn history_with_trigger(
        mut self,
        member: impl Into<String>,
        node: impl Into<String>,
        capacity: usize,
        trigger: ChangeTrigger,
    ) -> Self {
        self.declarations.push(Declaration {
            member: member.into(),
            node: node.into(),
            attribute: AttributeSelector::Value,
            index_range: None,
            trigger,
            destination: DestinationKind::BoundedHistory { capacity },
        });
        self
    }

    /// Declare an expiring-events member fed from a node's event
    /// notifier.
    #[must_use]
    pub fn events(
        mut self,
        member: impl Into<String>,
        node: impl Into<String>,
        ttl: Duration,
        queue_depth: Option<usize>,
    ) -> Self {
        self.declarations.push(Declaration {
            member: member.into(),
            node: node.into(),
            attribute: AttributeSelector::EventNotifier,
            index_range: None,
            trigger: ChangeTrigger::default(),
            destination: DestinationKind::ExpiringEvents { ttl, queue_depth },
        });
        self
    }

    /// Narrow the most recently declared member with an index range.
    #[must_use]
    pub fn with_index_range(mut self, range: impl Into<String>) -> Self {
        if let Some(last) = self.declarations.last_mut() {
            last.index_range = Some(range.into());
        }
        self
    }
}

/// The validated, immutable binding table.
///
/// Read-only after construction and safe to share across threads.
/// Lookup from an [`ItemAddress`] to its entry is O(1) expected.
#[derive(Debug)]
pub struct BindingTable {
    subscription: SubscriptionSpec,
    entries: Vec<BindingEntry>,
    by_address: HashMap<ItemAddress, usize>,
}

impl BindingTable {
    /// Validate a model and freeze it into a table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when the subscription
    /// configuration is unusable, an address fails to parse, a
    /// capacity or ttl is zero, or two declarations collide on a
    /// member name or item address.
    pub fn build(model: BindingModel) -> Result<Self, ConfigurationError> {
        let subscription = model.subscription;

        if subscription.endpoint_url.trim().is_empty() {
            return Err(ConfigurationError::InvalidEndpoint {
                url: subscription.endpoint_url.clone(),
                reason: "endpoint URL is empty".to_string(),
            });
        }
        if subscription.publishing_interval.is_zero() {
            return Err(ConfigurationError::ZeroPublishingInterval);
        }

        let mut entries = Vec::with_capacity(model.declarations.len());
        let mut by_address: HashMap<ItemAddress, usize> = HashMap::new();
        let mut seen_members: HashSet<String> = HashSet::new();

        for declaration in model.declarations {
            if declaration.member.trim().is_empty() {
                return Err(ConfigurationError::EmptyMember);
            }
            if !seen_members.insert(declaration.member.clone()) {
                return Err(ConfigurationError::DuplicateMember {
                    member: declaration.member,
                });
            }

            let node = NodeAddress::parse(&declaration.node)?;
            let address = ItemAddress {
                node,
                attribute: declaration.attribute,
                index_range: declaration.index_range.map(IndexRange),
            };

            match &declaration.destination {
                DestinationKind::Scalar => {}
                DestinationKind::BoundedHistory { capacity } => {
                    if *capacity == 0 {
                        return Err(ConfigurationError::ZeroCapacity {
                            member: declaration.member,
                        });
                    }
                }
                DestinationKind::ExpiringEvents { ttl, .. } => {
                    if ttl.is_zero() {
                        return Err(ConfigurationError::ZeroTtl {
                            member: declaration.member,
                        });
                    }
                }
            }

            let slot = entries.len();
            if by_address.insert(address.clone(), slot).is_some() {
                return Err(ConfigurationError::DuplicateBinding {
                    member: declaration.member,
                    address: address.to_string(),
                });
            }

            entries.push(BindingEntry {
                member: MemberId::new(declaration.member),
                address,
                trigger: declaration.trigger,
                destination: declaration.destination,
            });
        }

        Ok(Self {
            subscription,
            entries,
            by_address,
        })
    }

    /// Re-run the construction-time checks against the frozen table.
    ///
    /// Always succeeds on a built table; exists so callers can assert
    /// the invariants hold after configuration round-trips.
    pub fn revalidate(&self) -> Result<(), ConfigurationError> {
        for entry in &self.entries {
            match &entry.destination {
                DestinationKind::Scalar => {}
                DestinationKind::BoundedHistory { capacity } => {
                    if *capacity == 0 {
                        return Err(ConfigurationError::ZeroCapacity {
                            member: entry.member.to_string(),
                        });
                    }
                }
                DestinationKind::ExpiringEvents { ttl, .. } => {
                    if ttl.is_zero() {
                        return Err(ConfigurationError::ZeroTtl {
                            member: entry.member.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// The subscription-level configuration.
    #[must_use]
    pub fn subscription(&self) -> &SubscriptionSpec {
        &self.subscription
    }

    /// Every validated entry, declaration order.
    #[must_use]
    pub fn entries(&self) -> &[BindingEntry] {
        &self.entries
    }

    /// Resolve the entry bound to an address, if any.
    #[must_use]
    pub fn lookup(&self, address: &ItemAddress) -> Option<&BindingEntry> {
        self.by_address.get(address).map(|&slot| &self.entries[slot])
    }

    /// The full interest set to register with the transport: one per
    /// entry, carrying its trigger and delivery queue depth.
    #[must_use]
    pub fn monitored_interests(&self) -> Vec<MonitoredInterest> {
        self.entries
            .iter()
            .map(|entry| MonitoredInterest {
                address: entry.address.clone(),
                trigger: entry.trigger,
                queue_depth: match &entry.destination {
                    DestinationKind::ExpiringEvents { queue_depth, .. } => {
                        queue_depth.unwrap_or(DEFAULT_EVENT_QUEUE_DEPTH)
                    }
                    _ => DATA_QUEUE_DEPTH,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> BindingModel {
        BindingModel::new("opc.tcp://localhost:26543", Duration::from_millis(250), 20)
    }

    #[test]
    fn test_valid_model_builds() {
        let table = BindingTable::build(
            model()
                .scalar("robot1_mode", "ns=2;s=Robot1_Mode")
                .history("robot1_axis1_history", "ns=2;s=Robot1_Axis1", 240)
                .events("robot1_events", "ns=2;s=Robot1", Duration::from_secs(5), Some(8)),
        )
        .unwrap();

        assert_eq!(table.entries().len(), 3);
        assert!(table.revalidate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result =
            BindingTable::build(model().history("axis_history", "ns=2;s=Robot1_Axis1", 0));
        assert!(matches!(
            result,
            Err(ConfigurationError::ZeroCapacity { .. })
        ));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let result = BindingTable::build(model().events(
            "robot1_events",
            "ns=2;s=Robot1",
            Duration::ZERO,
            None,
        ));
        assert!(matches!(result, Err(ConfigurationError::ZeroTtl { .. })));
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let result = BindingTable::build(
            model()
                .scalar("mode_a", "ns=2;s=Robot1_Mode")
                .scalar("mode_b", "ns=2;s=Robot1_Mode"),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::DuplicateBinding { .. })
        ));
    }

    #[test]
    fn test_same_node_distinct_selectors_allowed() {
        let table = BindingTable::build(
            model()
                .scalar("robot1_mode", "ns=2;s=Robot1")
                .events("robot1_events", "ns=2;s=Robot1", Duration::from_secs(5), None),
        )
        .unwrap();
        assert_eq!(table.entries().len(), 2);
    }

    #[test]
    fn test_malformed_address_rejected() {
        let result = BindingTable::build(model().scalar("mode", "Robot1_Mode"));
        assert!(matches!(
            result,
            Err(ConfigurationError::MalformedAddress { .. })
        ));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let result = BindingTable::build(
            model()
                .scalar("mode", "ns=2;s=Robot1_Mode")
                .scalar("mode", "ns=2;s=Robot1_Speed"),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::DuplicateMember { .. })
        ));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let result = BindingTable::build(BindingModel::new(
            "  ",
            Duration::from_millis(250),
            20,
        ));
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_zero_publishing_interval_rejected() {
        let result =
            BindingTable::build(BindingModel::new("opc.tcp://localhost:26543", Duration::ZERO, 20));
        assert!(matches!(
            result,
            Err(ConfigurationError::ZeroPublishingInterval)
        ));
    }

    #[test]
    fn test_lookup_resolves_by_full_address() {
        let table = BindingTable::build(model().scalar("mode", "ns=2;s=Robot1_Mode")).unwrap();

        let bound = ItemAddress::value(NodeAddress::string(2, "Robot1_Mode"));
        assert!(table.lookup(&bound).is_some());

        let unbound = ItemAddress::value(NodeAddress::string(2, "Robot1_Speed"));
        assert!(table.lookup(&unbound).is_none());
    }

    #[test]
    fn test_monitored_interests_carry_queue_depths() {
        let table = BindingTable::build(
            model()
                .scalar("mode", "ns=2;s=Robot1_Mode")
                .events("events", "ns=2;s=Robot1", Duration::from_secs(5), None)
                .events("events2", "ns=2;s=Robot2", Duration::from_secs(5), Some(16)),
        )
        .unwrap();

        let interests = table.monitored_interests();
        assert_eq!(interests.len(), 3);
        assert_eq!(interests[0].queue_depth, 1);
        assert_eq!(interests[1].queue_depth, DEFAULT_EVENT_QUEUE_DEPTH);
        assert_eq!(interests[2].queue_depth, 16);
    }
}
