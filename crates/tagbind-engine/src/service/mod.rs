//! # Service Layer
//!
//! Wires the domain to the transport port: the subscription lifecycle
//! state machine, the command gateway, and the engine facade.

pub mod engine;
pub mod gateway;
pub mod lifecycle;

pub use engine::BindingEngine;
pub use gateway::CommandGateway;
pub use lifecycle::{RetryPolicy, SubscriptionLifecycle};
