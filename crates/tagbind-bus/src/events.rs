//! # State Events
//!
//! The event types that flow over the bus, and the filter observers
//! subscribe with.

use std::collections::HashSet;

use tagbind_types::{ConnectionState, DataValue, MemberId};

/// A model-level change published by the binding engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// A scalar member took a new reading.
    ///
    /// Published only when the new `(value, status)` pair differs from
    /// the previous one — redundant transport deliveries are coalesced
    /// at the destination.
    ScalarChanged {
        /// The changed member.
        member: MemberId,
        /// The new reading.
        value: DataValue,
    },

    /// A bounded history received a new entry.
    ///
    /// Per-entry payloads (including evictions) are observed on the
    /// ring buffer's own channel; this signal tells model observers to
    /// re-snapshot.
    HistoryAppended {
        /// The appended-to member.
        member: MemberId,
    },

    /// The subscription lifecycle changed state.
    ConnectionStateChanged {
        /// The state entered.
        state: ConnectionState,
    },
}

impl StateEvent {
    /// The member this event concerns, when it concerns one.
    #[must_use]
    pub fn member(&self) -> Option<&MemberId> {
        match self {
            StateEvent::ScalarChanged { member, .. }
            | StateEvent::HistoryAppended { member } => Some(member),
            StateEvent::ConnectionStateChanged { .. } => None,
        }
    }
}

/// Which events a subscription receives.
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Restrict member events to this set; `None` passes every member.
    members: Option<HashSet<MemberId>>,
    /// Whether connection-state events pass.
    connection: bool,
}

impl EventFilter {
    /// Pass every event.
    #[must_use]
    pub fn all() -> Self {
        Self {
            members: None,
            connection: true,
        }
    }

    /// Pass only events for the given members.
    #[must_use]
    pub fn members<I, M>(members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        Self {
            members: Some(members.into_iter().map(Into::into).collect()),
            connection: false,
        }
    }

    /// Pass only connection-state events.
    #[must_use]
    pub fn connection_only() -> Self {
        Self {
            members: Some(HashSet::new()),
            connection: true,
        }
    }

    /// Additionally pass connection-state events.
    #[must_use]
    pub fn with_connection(mut self) -> Self {
        self.connection = true;
        self
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &StateEvent) -> bool {
        match event.member() {
            Some(member) => self
                .members
                .as_ref()
                .is_none_or(|allowed| allowed.contains(member)),
            None => self.connection,
        }
    }

    /// Short description used for subscription bookkeeping.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.members {
            None => "all".to_string(),
            Some(set) if set.is_empty() => "connection".to_string(),
            Some(set) => {
                let mut names: Vec<&str> = set.iter().map(MemberId::as_str).collect();
                names.sort_unstable();
                names.join(",")
            }
        }
    }
}
