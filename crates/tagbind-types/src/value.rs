//! # Value Model
//!
//! The self-describing `Variant` union, wire status codes, and the
//! timestamped `DataValue` envelope every notification carries.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::address::ItemAddress;

/// A self-describing scalar value.
///
/// Equality on this union is the model's equality: the router uses it
/// to coalesce redundant scalar deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    /// No value.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Null
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Boolean(v)
    }
}

impl From<i16> for Variant {
    fn from(v: i16) -> Self {
        Variant::Int16(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int32(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int64(v)
    }
}

impl From<f32> for Variant {
    fn from(v: f32) -> Self {
        Variant::Float(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Double(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Null => write!(f, "null"),
            Variant::Boolean(v) => write!(f, "{v}"),
            Variant::Int16(v) => write!(f, "{v}"),
            Variant::Int32(v) => write!(f, "{v}"),
            Variant::Int64(v) => write!(f, "{v}"),
            Variant::Float(v) => write!(f, "{v}"),
            Variant::Double(v) => write!(f, "{v}"),
            Variant::String(v) => write!(f, "{v}"),
        }
    }
}

/// Wire status code attached to every delivered value and command
/// result.
///
/// Zero is the all-good code; the top two bits carry the severity.
/// Error statuses are part of the value — the engine stores and
/// forwards them unchanged, never substituting a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// Operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0);
    /// Severity mask: uncertain.
    pub const UNCERTAIN: StatusCode = StatusCode(0x4000_0000);
    /// Severity mask: bad.
    pub const BAD: StatusCode = StatusCode(0x8000_0000);

    const SEVERITY_MASK: u32 = 0xC000_0000;

    /// True when the severity bits signal success.
    #[must_use]
    pub fn is_good(self) -> bool {
        self.0 & Self::SEVERITY_MASK == 0
    }

    /// True when the severity bits signal an uncertain value.
    #[must_use]
    pub fn is_uncertain(self) -> bool {
        self.0 & Self::SEVERITY_MASK == Self::UNCERTAIN.0
    }

    /// True when the severity bits signal failure.
    #[must_use]
    pub fn is_bad(self) -> bool {
        self.0 & Self::SEVERITY_MASK == Self::BAD.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// A status-tagged, timestamped value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataValue {
    /// The carried value.
    pub value: Variant,
    /// Status code reported by the source.
    pub status: StatusCode,
    /// Timestamp assigned by the data source, when known.
    pub source_timestamp: Option<SystemTime>,
    /// Timestamp assigned by the server, when known.
    pub server_timestamp: Option<SystemTime>,
}

impl DataValue {
    /// A good-status value with no timestamps.
    #[must_use]
    pub fn good(value: impl Into<Variant>) -> Self {
        Self {
            value: value.into(),
            status: StatusCode::GOOD,
            source_timestamp: None,
            server_timestamp: None,
        }
    }

    /// A value with an explicit status code.
    #[must_use]
    pub fn with_status(value: impl Into<Variant>, status: StatusCode) -> Self {
        Self {
            value: value.into(),
            status,
            source_timestamp: None,
            server_timestamp: None,
        }
    }

    /// Attach source and server timestamps.
    #[must_use]
    pub fn at(mut self, source: SystemTime, server: SystemTime) -> Self {
        self.source_timestamp = Some(source);
        self.server_timestamp = Some(server);
        self
    }

    /// Equality used for scalar coalescing: value and status only.
    ///
    /// Timestamps are excluded so transport redeliveries carrying
    /// fresh timestamps still coalesce at the destination.
    #[must_use]
    pub fn same_reading(&self, other: &DataValue) -> bool {
        self.value == other.value && self.status == other.status
    }
}

/// The unit delivered by the subscription transport: one value for one
/// address.
///
/// Immutable once created. Delivery is FIFO per address; no ordering
/// is guaranteed across addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueNotification {
    /// The address the value was reported for.
    pub address: ItemAddress,
    /// The delivered value.
    pub value: DataValue,
}

impl ValueNotification {
    /// Create a notification.
    #[must_use]
    pub fn new(address: ItemAddress, value: DataValue) -> Self {
        Self { address, value }
    }
}

/// A three-position mode switch (off / hand / auto) as exposed by the
/// plant's mode items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum HandOffAuto {
    /// Drive disabled.
    Off = 0,
    /// Manual control.
    Hand = 1,
    /// Automatic control.
    Auto = 2,
}

impl From<HandOffAuto> for Variant {
    fn from(mode: HandOffAuto) -> Self {
        Variant::Int16(mode as i16)
    }
}
