//! # Integration Scenarios
//!
//! Cross-crate flows through the assembled binding engine.

pub mod binding_flows;
pub mod command_flows;
pub mod lifecycle_flows;
