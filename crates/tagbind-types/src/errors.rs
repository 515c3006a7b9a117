//! # Error Taxonomy
//!
//! Two roots: `ConfigurationError` for programmer errors caught at
//! construction (fatal, never retried) and `TransportError` for
//! recoverable faults on the wire (surfaced as typed results, retried
//! only where the lifecycle policy says so).

use thiserror::Error;

use crate::value::StatusCode;

/// Fatal construction-time errors.
///
/// Raised while building a binding table or lowering a configuration
/// file. These are programmer errors: the caller fixes the declaration
/// and restarts; nothing retries them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// An item address failed to parse.
    #[error("malformed address {address:?}: {reason}")]
    MalformedAddress { address: String, reason: String },

    /// A bounded history was declared with capacity zero.
    #[error("member {member:?}: bounded history capacity must be greater than zero")]
    ZeroCapacity { member: String },

    /// An expiring event set was declared with a zero time-to-live.
    #[error("member {member:?}: event time-to-live must be greater than zero")]
    ZeroTtl { member: String },

    /// Two bindings resolved to the same item address.
    #[error("member {member:?}: duplicate binding for address {address}")]
    DuplicateBinding { member: String, address: String },

    /// Two bindings declared the same member name.
    #[error("duplicate member name {member:?}")]
    DuplicateMember { member: String },

    /// A binding declared an empty member name.
    #[error("member names must not be empty")]
    EmptyMember,

    /// The subscription endpoint is unusable.
    #[error("invalid endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The publishing interval was zero.
    #[error("publishing interval must be greater than zero")]
    ZeroPublishingInterval,

    /// A configuration file named an unknown destination kind.
    #[error("member {member:?}: unknown binding kind {kind:?}")]
    UnknownBindingKind { member: String, kind: String },

    /// A configuration file named an unknown change trigger.
    #[error("member {member:?}: unknown change trigger {trigger:?}")]
    UnknownChangeTrigger { member: String, trigger: String },
}

/// Recoverable transport faults.
///
/// Subscription-level faults drive automatic re-establishment; a fault
/// on a single write/invoke is returned to the caller as a failed
/// result and is never retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No session is established.
    #[error("transport is not connected")]
    NotConnected,

    /// The session dropped mid-flight.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The server rejected the request.
    #[error("request rejected with status {status}")]
    Rejected { status: StatusCode },

    /// The transport's own deadline elapsed.
    #[error("transport operation timed out")]
    Timeout,

    /// The notification channel closed unexpectedly.
    #[error("notification channel closed")]
    ChannelClosed,

    /// Malformed traffic or a protocol-level violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}
