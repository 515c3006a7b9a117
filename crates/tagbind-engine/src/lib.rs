//! # TagBind Binding Engine
//!
//! The core of TagBind: resolves a declarative binding table mapping
//! addressable telemetry items to state members, applies incoming
//! value-change notifications with per-kind semantics (scalar
//! overwrite with equality coalescing, bounded history, expiring event
//! set), and forwards write/invoke commands back to the same
//! endpoints without blocking the inbound stream.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** `BindingTable`, `StateStore`,
//!   `NotificationRouter` — pure routing and state logic
//! - **Ports Layer:** `SubscriptionTransport` — the SPI the host
//!   implements over its wire protocol
//! - **Service Layer:** `SubscriptionLifecycle`, `CommandGateway`,
//!   and the `BindingEngine` facade
//! - **Adapters Layer:** `InMemoryTransport` for tests and local runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tagbind_engine::{BindingEngine, BindingModel, InMemoryTransport};
//!
//! let model = BindingModel::new("opc.tcp://localhost:26543", Duration::from_millis(250), 20)
//!     .scalar("robot1_mode", "ns=2;s=Robot1_Mode")
//!     .history("robot1_axis1_history", "ns=2;s=Robot1_Axis1", 240)
//!     .events("robot1_events", "ns=2;s=Robot1", Duration::from_secs(5), Some(8));
//!
//! let transport = Arc::new(InMemoryTransport::new());
//! let engine = BindingEngine::build(model, transport)?;
//! engine.start();
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Domain
pub use domain::{
    BindingEntry, BindingModel, BindingTable, ChangeTrigger, DestinationKind, MonitoredInterest,
    NotificationRouter, RouterMetrics, StateStore, SubscriptionSpec, DEFAULT_EVENT_QUEUE_DEPTH,
};

// Ports
pub use ports::{SubscriptionTransport, TransportSession, NOTIFICATION_CHANNEL_CAPACITY};

// Service
pub use service::{BindingEngine, CommandGateway, RetryPolicy, SubscriptionLifecycle};

// Adapters
pub use adapters::InMemoryTransport;
