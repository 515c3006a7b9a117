//! # Simulated Plant Transport
//!
//! A generator-backed `SubscriptionTransport` shaped like the robot
//! cell the engine was built for: a mode switch, sine-wave axis
//! positions, and a periodic alarm on the event notifier. Lets the
//! whole stack run — subscription, routing, writes, invokes — with no
//! hardware or server.

use std::sync::Mutex;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use tagbind_engine::{
    MonitoredInterest, SubscriptionSpec, SubscriptionTransport, TransportSession,
    NOTIFICATION_CHANNEL_CAPACITY,
};
use tagbind_types::{
    AttributeSelector, DataValue, Identifier, InvokeResult, InvokeSpec, StatusCode,
    TransportError, ValueNotification, Variant, WriteResult, WriteSpec,
};

/// Simulated plant: answers every registered interest with generated
/// traffic and accepts writes/invokes against the robot's nodes.
pub struct SimulatedPlantTransport {
    /// Writes accepted so far (mode changes land here).
    accepted_writes: Mutex<Vec<WriteSpec>>,
}

impl SimulatedPlantTransport {
    /// Create a simulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accepted_writes: Mutex::new(Vec::new()),
        }
    }

    /// Writes the plant has accepted.
    #[must_use]
    pub fn accepted_writes(&self) -> Vec<WriteSpec> {
        self.accepted_writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    fn generate(interest: &MonitoredInterest, step: u64) -> Option<ValueNotification> {
        let name = match &interest.address.node.identifier {
            Identifier::String(name) => name.clone(),
            Identifier::Numeric(id) => id.to_string(),
        };
        let now = SystemTime::now();

        let value = match interest.address.attribute {
            AttributeSelector::Value => {
                if name.contains("Mode") {
                    // Cycle off / hand / auto every ten seconds or so.
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    let mode = ((step / 40) % 3) as i16;
                    DataValue::good(mode).at(now, now)
                } else {
                    // Axis positions sweep as offset sine waves.
                    #[allow(clippy::cast_precision_loss)]
                    let phase = (step as f64) / 10.0 + f64::from(name.len() as u32);
                    #[allow(clippy::cast_possible_truncation)]
                    let position = (phase.sin() * 90.0) as f32;
                    DataValue::good(position).at(now, now)
                }
            }
            AttributeSelector::EventNotifier => {
                if step % 20 != 0 {
                    return None;
                }
                DataValue::good(format!("{name}: axis limit approached")).at(now, now)
            }
        };

        Some(ValueNotification::new(interest.address.clone(), value))
    }
}

impl Default for SimulatedPlantTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionTransport for SimulatedPlantTransport {
    async fn establish(
        &self,
        spec: &SubscriptionSpec,
        interests: &[MonitoredInterest],
    ) -> Result<TransportSession, TransportError> {
        let (tx, rx) = mpsc::channel(NOTIFICATION_CHANNEL_CAPACITY);
        let interests = interests.to_vec();
        let tick = spec.publishing_interval;

        debug!(
            endpoint = %spec.endpoint_url,
            items = interests.len(),
            "simulated subscription established"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            let mut step: u64 = 0;
            loop {
                ticker.tick().await;
                step += 1;
                for interest in &interests {
                    let Some(notification) = Self::generate(interest, step) else {
                        continue;
                    };
                    if tx.send(notification).await.is_err() {
                        // Session dropped; stop generating.
                        return;
                    }
                }
            }
        });

        Ok(TransportSession { notifications: rx })
    }

    async fn write(&self, requests: &[WriteSpec]) -> Result<Vec<WriteResult>, TransportError> {
        if let Ok(mut writes) = self.accepted_writes.lock() {
            writes.extend_from_slice(requests);
        }
        Ok(requests
            .iter()
            .map(|_| WriteResult {
                status: StatusCode::GOOD,
            })
            .collect())
    }

    async fn invoke(&self, spec: &InvokeSpec) -> Result<InvokeResult, TransportError> {
        let is_multiply = matches!(
            &spec.method.identifier,
            Identifier::String(name) if name.ends_with("Multiply")
        );
        if !is_multiply {
            return Err(TransportError::Rejected {
                status: StatusCode::BAD,
            });
        }

        let product = spec
            .input_arguments
            .iter()
            .try_fold(1.0f64, |acc, argument| match argument {
                Variant::Double(v) => Some(acc * v),
                Variant::Float(v) => Some(acc * f64::from(*v)),
                Variant::Int16(v) => Some(acc * f64::from(*v)),
                Variant::Int32(v) => Some(acc * f64::from(*v)),
                _ => None,
            })
            .ok_or_else(|| TransportError::Protocol("non-numeric input argument".to_string()))?;

        Ok(InvokeResult {
            status: StatusCode::GOOD,
            output_arguments: vec![Variant::Double(product)],
        })
    }
}
