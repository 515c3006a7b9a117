//! # Ports Layer
//!
//! Trait definitions for the external collaborators this crate
//! requires the host to supply.

pub mod outbound;

pub use outbound::{SubscriptionTransport, TransportSession, NOTIFICATION_CHANNEL_CAPACITY};
