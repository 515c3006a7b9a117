//! # TagBind State-Event Bus
//!
//! The observation surface between the binding engine and a
//! presentation layer. The engine publishes typed [`StateEvent`]s —
//! scalar changes, history appends, connection-state transitions —
//! and observers take filtered subscriptions or `Stream` adapters.
//!
//! Payload-level collection events (ring pushes and evictions, event
//! occurrences and expirations) are observed on the owning container's
//! own channel; this bus carries the model-level signals.
//!
//! ## Delivery
//!
//! Fan-out uses `tokio::sync::broadcast`: publishing never blocks on
//! slow observers; an observer that falls behind lags and skips.
//! Delivering a received event onto a UI thread (or any other
//! execution context) is the observer's responsibility, not the
//! bus's.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod events;
pub mod subscription;

// Re-export main types
pub use bus::StateEventBus;
pub use events::{EventFilter, StateEvent};
pub use subscription::{BusSubscription, StateEventStream, SubscriptionError};

/// Maximum events buffered per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
