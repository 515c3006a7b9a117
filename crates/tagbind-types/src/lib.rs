//! # TagBind Shared Types
//!
//! Value objects shared by every TagBind crate: item addressing, the
//! variant value model, notification and command shapes, and the error
//! taxonomy.
//!
//! ## Clusters
//!
//! - **Addressing**: `NodeAddress`, `AttributeSelector`, `IndexRange`,
//!   `ItemAddress`
//! - **Values**: `Variant`, `StatusCode`, `DataValue`,
//!   `ValueNotification`, `HandOffAuto`
//! - **Commands**: `WriteSpec`, `WriteResult`, `InvokeSpec`,
//!   `InvokeResult`
//! - **State model**: `MemberId`, `ConnectionState`
//! - **Errors**: `ConfigurationError` (fatal at construction),
//!   `TransportError` (recoverable, surfaced as typed results)

pub mod address;
pub mod command;
pub mod errors;
pub mod state;
pub mod value;

// Re-export main types
pub use address::{AttributeSelector, Identifier, IndexRange, ItemAddress, NodeAddress};
pub use command::{InvokeResult, InvokeSpec, WriteResult, WriteSpec};
pub use errors::{ConfigurationError, TransportError};
pub use state::{ConnectionState, MemberId};
pub use value::{DataValue, HandOffAuto, StatusCode, ValueNotification, Variant};
