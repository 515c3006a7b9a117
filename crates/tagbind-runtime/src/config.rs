//! # Runtime Configuration
//!
//! TOML-shaped configuration for the subscription and the binding
//! list, lowered into the engine's `BindingModel`. All values are
//! supplied at startup; there is no hot-reload.
//!
//! ```toml
//! [subscription]
//! endpoint_url = "opc.tcp://localhost:26543"
//! publishing_interval_ms = 250
//! keep_alive_count = 20
//!
//! [[binding]]
//! member = "robot1_mode"
//! address = "ns=2;s=Robot1_Mode"
//! kind = "scalar"
//!
//! [[binding]]
//! member = "robot1_axis1_history"
//! address = "ns=2;s=Robot1_Axis1"
//! kind = "history"
//! capacity = 240
//!
//! [[binding]]
//! member = "robot1_events"
//! address = "ns=2;s=Robot1"
//! kind = "events"
//! ttl_ms = 5000
//! queue_depth = 8
//! ```

use std::time::Duration;

use serde::Deserialize;

use tagbind_engine::{BindingModel, ChangeTrigger};
use tagbind_types::ConfigurationError;

fn default_publishing_interval_ms() -> u64 {
    250
}

fn default_keep_alive_count() -> u32 {
    20
}

/// Subscription-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Endpoint the transport connects to.
    pub endpoint_url: String,
    /// Server-side publishing interval in milliseconds.
    #[serde(default = "default_publishing_interval_ms")]
    pub publishing_interval_ms: u64,
    /// Keep-alive count forwarded to the transport.
    #[serde(default = "default_keep_alive_count")]
    pub keep_alive_count: u32,
}

/// One declared binding.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingConfig {
    /// Destination member name.
    pub member: String,
    /// Item address in canonical text form.
    pub address: String,
    /// Destination kind: `scalar`, `history`, or `events`.
    pub kind: String,
    /// History capacity (required for `history`).
    pub capacity: Option<usize>,
    /// Event time-to-live in milliseconds (required for `events`).
    pub ttl_ms: Option<u64>,
    /// Event delivery queue depth (optional for `events`).
    pub queue_depth: Option<usize>,
    /// Change trigger: `status-value` (default) or
    /// `status-value-timestamp`.
    pub trigger: Option<String>,
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Subscription settings.
    pub subscription: SubscriptionConfig,
    /// Declared bindings.
    #[serde(default, rename = "binding")]
    pub bindings: Vec<BindingConfig>,
}

impl RuntimeConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed TOML; semantic
    /// validation happens in [`into_model`](RuntimeConfig::into_model).
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Lower into the engine's declarative model.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for unknown kinds or triggers
    /// and for missing capacity/ttl values; the binding table's own
    /// validation then covers addresses and ranges.
    pub fn into_model(self) -> Result<BindingModel, ConfigurationError> {
        let mut model = BindingModel::new(
            self.subscription.endpoint_url,
            Duration::from_millis(self.subscription.publishing_interval_ms),
            self.subscription.keep_alive_count,
        );

        for binding in self.bindings {
            let trigger = parse_trigger(&binding.member, binding.trigger.as_deref())?;
            model = match binding.kind.as_str() {
                "scalar" => model.scalar_with_trigger(binding.member, binding.address, trigger),
                "history" => {
                    // A missing capacity fails the same way a zero one
                    // does.
                    let capacity = binding.capacity.unwrap_or(0);
                    model.history_with_trigger(binding.member, binding.address, capacity, trigger)
                }
                "events" => {
                    let ttl = Duration::from_millis(binding.ttl_ms.unwrap_or(0));
                    model.events(binding.member, binding.address, ttl, binding.queue_depth)
                }
                other => {
                    return Err(ConfigurationError::UnknownBindingKind {
                        member: binding.member,
                        kind: other.to_string(),
                    })
                }
            };
        }

        Ok(model)
    }
}

fn parse_trigger(member: &str, trigger: Option<&str>) -> Result<ChangeTrigger, ConfigurationError> {
    match trigger {
        None | Some("status-value") => Ok(ChangeTrigger::StatusValue),
        Some("status-value-timestamp") => Ok(ChangeTrigger::StatusValueTimestamp),
        Some(other) => Err(ConfigurationError::UnknownChangeTrigger {
            member: member.to_string(),
            trigger: other.to_string(),
        }),
    }
}
