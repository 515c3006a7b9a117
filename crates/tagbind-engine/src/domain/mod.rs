//! # Domain Layer
//!
//! Pure binding logic: the declarative table, the destination state
//! store, and the notification router. Nothing here performs I/O.

pub mod binding;
pub mod router;
pub mod state;

pub use binding::{
    BindingEntry, BindingModel, BindingTable, ChangeTrigger, DestinationKind, MonitoredInterest,
    SubscriptionSpec, DEFAULT_EVENT_QUEUE_DEPTH,
};
pub use router::{NotificationRouter, RouterMetrics};
pub use state::StateStore;
