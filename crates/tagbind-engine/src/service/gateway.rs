//! # Command Gateway
//!
//! Outbound write/invoke submission. Gateway calls run concurrently
//! with notification routing and with each other; each call is
//! isolated — a failure becomes an error result for that call only
//! and can never take down the notification path.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use tagbind_types::{InvokeResult, InvokeSpec, TransportError, WriteResult, WriteSpec};

use crate::ports::SubscriptionTransport;

/// Submits writes and invokes through the transport.
///
/// Cheap to clone; clones share the transport handle.
#[derive(Clone)]
pub struct CommandGateway {
    transport: Arc<dyn SubscriptionTransport>,
}

impl CommandGateway {
    /// Create a gateway over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn SubscriptionTransport>) -> Self {
        Self { transport }
    }

    /// Write a batch of attribute values.
    ///
    /// Results positionally match the request order. A transport
    /// fault is returned to the caller; nothing retries it and no
    /// local state is touched.
    pub async fn write(
        &self,
        requests: Vec<WriteSpec>,
    ) -> Result<Vec<WriteResult>, TransportError> {
        match self.transport.write(&requests).await {
            Ok(results) => {
                debug!(count = results.len(), "write batch completed");
                Ok(results)
            }
            Err(error) => {
                warn!(count = requests.len(), %error, "write batch failed");
                Err(error)
            }
        }
    }

    /// Invoke a method on an object.
    ///
    /// The caller reads `output_arguments` positionally. A transport
    /// fault is returned to the caller and not retried.
    pub async fn invoke(&self, spec: InvokeSpec) -> Result<InvokeResult, TransportError> {
        let method = spec.method.clone();
        match self.transport.invoke(&spec).await {
            Ok(result) => {
                debug!(%method, outputs = result.output_arguments.len(), "invoke completed");
                Ok(result)
            }
            Err(error) => {
                warn!(%method, %error, "invoke failed");
                Err(error)
            }
        }
    }

    /// Fire-and-forget write.
    ///
    /// Spawns a task that drains the transport result and logs it
    /// under a correlation id, so an abandoned call never leaks its
    /// outcome.
    pub fn submit_write(&self, requests: Vec<WriteSpec>) {
        let transport = self.transport.clone();
        let correlation = Uuid::new_v4();
        tokio::spawn(async move {
            match transport.write(&requests).await {
                Ok(results) => {
                    debug!(%correlation, count = results.len(), "submitted write drained");
                }
                Err(error) => {
                    warn!(%correlation, %error, "submitted write failed");
                }
            }
        });
    }

    /// Fire-and-forget invoke. Same draining contract as
    /// [`submit_write`](CommandGateway::submit_write).
    pub fn submit_invoke(&self, spec: InvokeSpec) {
        let transport = self.transport.clone();
        let correlation = Uuid::new_v4();
        tokio::spawn(async move {
            let method = spec.method.clone();
            match transport.invoke(&spec).await {
                Ok(result) => {
                    debug!(%correlation, %method, outputs = result.output_arguments.len(),
                        "submitted invoke drained");
                }
                Err(error) => {
                    warn!(%correlation, %method, %error, "submitted invoke failed");
                }
            }
        });
    }
}
