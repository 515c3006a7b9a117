//! # Adapters
//!
//! Concrete port implementations shipped with the engine. Production
//! transports live with the host application; the in-memory adapter
//! here backs tests and local runs.

pub mod memory;

pub use memory::InMemoryTransport;
