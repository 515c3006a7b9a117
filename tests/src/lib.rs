//! # TagBind Test Suite
//!
//! Unified test crate containing the cross-crate integration
//! scenarios. Per-module unit tests live next to the code they cover;
//! everything here exercises the assembled stack.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── binding_flows.rs    # notifications → table → state model
//!     ├── command_flows.rs    # writes and invokes through the gateway
//!     └── lifecycle_flows.rs  # faults, re-establishment, config wiring
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tagbind-tests
//!
//! # By category
//! cargo test -p tagbind-tests integration::binding_flows
//! cargo test -p tagbind-tests integration::command_flows
//! cargo test -p tagbind-tests integration::lifecycle_flows
//! ```

pub mod integration;
