//! # TagBind Collections
//!
//! Observable containers backing the binding engine's destination
//! kinds:
//!
//! - [`RingBuffer`] — fixed-capacity, insertion-ordered history with
//!   overwrite-oldest eviction and synchronous change notification.
//! - [`ExpiringSet`] — insertion-ordered occurrence set whose entries
//!   remove themselves after a per-entry time-to-live.
//!
//! Both containers notify observers over a `tokio::sync::broadcast`
//! channel obtained from `subscribe()`; observers that fall behind lag
//! and skip rather than block the writer.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod expiring;
pub mod ring;

// Re-export main types
pub use expiring::{ExpiringSet, OccurrenceId, SetEvent};
pub use ring::{RingBuffer, RingEvent};

/// Change events buffered per subscriber before lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
