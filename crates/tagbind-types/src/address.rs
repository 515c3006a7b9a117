//! # Item Addressing
//!
//! Identifies remote telemetry items. A `NodeAddress` names a node in
//! the server's address space; an `ItemAddress` adds the attribute
//! selector (value vs. event notifier) and an optional index range,
//! and is the key every notification is routed by.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// Node identifier within a namespace.
///
/// Servers expose both string-named and numerically-named nodes, so
/// both forms are representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    /// Numeric identifier (`i=2253`).
    Numeric(u32),
    /// String identifier (`s=Robot1_Mode`).
    String(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "i={n}"),
            Identifier::String(s) => write!(f, "s={s}"),
        }
    }
}

/// Address of a node in the remote address space.
///
/// The canonical text form is `ns=<namespace>;s=<name>` or
/// `ns=<namespace>;i=<number>`; when the namespace prefix is omitted,
/// namespace 0 is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    /// Namespace index.
    pub namespace: u16,
    /// Identifier within the namespace.
    pub identifier: Identifier,
}

impl NodeAddress {
    /// Create a string-identified node address.
    #[must_use]
    pub fn string(namespace: u16, name: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(name.into()),
        }
    }

    /// Create a numerically-identified node address.
    #[must_use]
    pub fn numeric(namespace: u16, id: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(id),
        }
    }

    /// Parse the canonical text form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MalformedAddress`] when the text
    /// does not match `[ns=<u16>;](s=<name>|i=<u32>)`.
    pub fn parse(text: &str) -> Result<Self, ConfigurationError> {
        let malformed = |reason: &str| ConfigurationError::MalformedAddress {
            address: text.to_string(),
            reason: reason.to_string(),
        };

        let (namespace, rest) = match text.strip_prefix("ns=") {
            Some(tail) => {
                let (ns_text, rest) = tail
                    .split_once(';')
                    .ok_or_else(|| malformed("missing ';' after namespace index"))?;
                let namespace = ns_text
                    .parse::<u16>()
                    .map_err(|_| malformed("namespace index is not a u16"))?;
                (namespace, rest)
            }
            None => (0, text),
        };

        if let Some(name) = rest.strip_prefix("s=") {
            if name.is_empty() {
                return Err(malformed("string identifier is empty"));
            }
            return Ok(Self::string(namespace, name));
        }

        if let Some(digits) = rest.strip_prefix("i=") {
            let id = digits
                .parse::<u32>()
                .map_err(|_| malformed("numeric identifier is not a u32"))?;
            return Ok(Self::numeric(namespace, id));
        }

        Err(malformed("identifier must start with 's=' or 'i='"))
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};{}", self.namespace, self.identifier)
    }
}

/// Which facet of a remote item a binding references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttributeSelector {
    /// The item's current value.
    #[default]
    Value,
    /// The item's event notifier (alarm/event stream).
    EventNotifier,
}

impl AttributeSelector {
    /// Numeric attribute id used on the wire.
    #[must_use]
    pub fn attribute_id(self) -> u32 {
        match self {
            AttributeSelector::EventNotifier => 12,
            AttributeSelector::Value => 13,
        }
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSelector::Value => write!(f, "value"),
            AttributeSelector::EventNotifier => write!(f, "event-notifier"),
        }
    }
}

/// Sub-selector narrowing an array-valued attribute (`"2:5"`, `"0"`).
///
/// Opaque to the engine; passed through to the transport unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange(pub String);

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully-qualified address of a bindable item: node, attribute
/// selector, and optional index range.
///
/// Equality is by value across all three fields; this is the key the
/// router resolves notifications with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemAddress {
    /// The addressed node.
    pub node: NodeAddress,
    /// Which attribute of the node is referenced.
    pub attribute: AttributeSelector,
    /// Optional index range for array-valued attributes.
    pub index_range: Option<IndexRange>,
}

impl ItemAddress {
    /// Address the value attribute of a node.
    #[must_use]
    pub fn value(node: NodeAddress) -> Self {
        Self {
            node,
            attribute: AttributeSelector::Value,
            index_range: None,
        }
    }

    /// Address the event notifier of a node.
    #[must_use]
    pub fn event_notifier(node: NodeAddress) -> Self {
        Self {
            node,
            attribute: AttributeSelector::EventNotifier,
            index_range: None,
        }
    }

    /// Narrow the address with an index range.
    #[must_use]
    pub fn with_index_range(mut self, range: impl Into<String>) -> Self {
        self.index_range = Some(IndexRange(range.into()));
        self
    }
}

impl fmt::Display for ItemAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node, self.attribute)?;
        if let Some(range) = &self.index_range {
            write!(f, "[{range}]")?;
        }
        Ok(())
    }
}
