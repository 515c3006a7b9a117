//! # Command Shapes
//!
//! Outbound request and result types: attribute writes and
//! remote-procedure invokes. Requests are transient; nothing here is
//! persisted.

use serde::{Deserialize, Serialize};

use crate::address::{ItemAddress, NodeAddress};
use crate::value::{DataValue, StatusCode, Variant};

/// A single attribute write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteSpec {
    /// Target item (node, attribute, optional index range).
    pub address: ItemAddress,
    /// Value to write.
    pub value: DataValue,
}

impl WriteSpec {
    /// Write a good-status value to a node's value attribute.
    #[must_use]
    pub fn scalar(node: NodeAddress, value: impl Into<Variant>) -> Self {
        Self {
            address: ItemAddress::value(node),
            value: DataValue::good(value),
        }
    }
}

/// Per-write outcome, positionally matching the submitted requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// Status reported by the server for this write.
    pub status: StatusCode,
}

impl WriteResult {
    /// True when the server accepted the write.
    #[must_use]
    pub fn is_good(self) -> bool {
        self.status.is_good()
    }
}

/// A remote-procedure invocation on an object's method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeSpec {
    /// The object owning the method.
    pub object: NodeAddress,
    /// The method to invoke.
    pub method: NodeAddress,
    /// Positional input arguments.
    pub input_arguments: Vec<Variant>,
}

impl InvokeSpec {
    /// Create an invocation with no arguments.
    #[must_use]
    pub fn new(object: NodeAddress, method: NodeAddress) -> Self {
        Self {
            object,
            method,
            input_arguments: Vec::new(),
        }
    }

    /// Append a positional input argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Variant>) -> Self {
        self.input_arguments.push(value.into());
        self
    }
}

/// Result of a method invocation.
///
/// Output arguments are read positionally; indexing past the method's
/// declared arity is a caller error, not defended here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResult {
    /// Status reported by the server for the call.
    pub status: StatusCode,
    /// Positional output arguments.
    pub output_arguments: Vec<Variant>,
}
