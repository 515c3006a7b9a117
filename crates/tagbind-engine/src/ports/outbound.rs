//! # Driven Ports (Outbound SPI)
//!
//! The interface this engine **requires** the host application to
//! implement over its subscription wire protocol. The engine never
//! implements the protocol itself.

use async_trait::async_trait;
use tokio::sync::mpsc;

use tagbind_types::{
    InvokeResult, InvokeSpec, TransportError, ValueNotification, WriteResult, WriteSpec,
};

use crate::domain::binding::{MonitoredInterest, SubscriptionSpec};

/// Bound of the per-session notification channel. The transport's
/// delivery task blocks on a full channel rather than dropping.
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

/// A live subscription session.
///
/// Dropping the sending half (inside the transport) closes the
/// channel, which the lifecycle observes as a fault.
pub struct TransportSession {
    /// Inbound notifications, FIFO per address.
    pub notifications: mpsc::Receiver<ValueNotification>,
}

/// Abstract interface to the subscription transport.
///
/// The host provides a concrete implementation (e.g., over an OPC UA
/// client stack); tests use the in-memory adapter.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the lifecycle pump,
/// the command gateway, and fire-and-forget draining tasks all hold
/// the same instance concurrently.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct UaClientTransport {
///     client: ua::Client,
/// }
///
/// #[async_trait]
/// impl SubscriptionTransport for UaClientTransport {
///     async fn establish(
///         &self,
///         spec: &SubscriptionSpec,
///         interests: &[MonitoredInterest],
///     ) -> Result<TransportSession, TransportError> {
///         // Create the subscription, register one monitored item per
///         // interest, and forward publish responses into the channel.
///         todo!()
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait SubscriptionTransport: Send + Sync {
    /// Establish a subscription session.
    ///
    /// Registers every interest (with its change trigger and delivery
    /// queue depth) and returns the channel notifications will arrive
    /// on. Called again after each fault by the lifecycle's retry
    /// policy — the interest set never changes between attempts.
    async fn establish(
        &self,
        spec: &SubscriptionSpec,
        interests: &[MonitoredInterest],
    ) -> Result<TransportSession, TransportError>;

    /// Write a batch of attribute values.
    ///
    /// Results are positional: `results[i]` answers `requests[i]`.
    async fn write(&self, requests: &[WriteSpec]) -> Result<Vec<WriteResult>, TransportError>;

    /// Invoke a method on an object.
    async fn invoke(&self, spec: &InvokeSpec) -> Result<InvokeResult, TransportError>;
}
