//! # State Model Identifiers
//!
//! Names for declared state members and the connection states the
//! subscription lifecycle moves through. These are shared entities:
//! the engine produces them, the bus carries them, the presentation
//! layer consumes them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of one declared state member (a scalar, a bounded history, or
/// an expiring event set).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    /// Create a member id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The member name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for MemberId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Lifecycle state of the telemetry subscription.
///
/// Transitions: `Unsubscribed → Establishing → Active`, `Active →
/// Faulted → Establishing` on transport faults, and any state →
/// `Unsubscribed` on explicit shutdown. `Unsubscribed` is terminal
/// only after shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No subscription exists.
    #[default]
    Unsubscribed,
    /// A session is being negotiated.
    Establishing,
    /// Notifications are flowing.
    Active,
    /// The transport faulted; re-establishment is pending.
    Faulted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Unsubscribed => write!(f, "unsubscribed"),
            ConnectionState::Establishing => write!(f, "establishing"),
            ConnectionState::Active => write!(f, "active"),
            ConnectionState::Faulted => write!(f, "faulted"),
        }
    }
}
