//! # TagBind Runtime
//!
//! The composition root: loads a TOML configuration, lowers it into
//! the engine's declarative binding model, initializes logging, and
//! ships a simulated plant transport so the whole stack runs without
//! real hardware.
//!
//! ## Modular Structure
//!
//! - `config` - TOML configuration and lowering into `BindingModel`
//! - `logging` - tracing subscriber initialization
//! - `sim` - `SimulatedPlantTransport`, a generator-backed transport

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod logging;
pub mod sim;

pub use config::{BindingConfig, RuntimeConfig, SubscriptionConfig};
pub use logging::init_logging;
pub use sim::SimulatedPlantTransport;
