//! # In-Memory Transport
//!
//! Scriptable `SubscriptionTransport` for tests and local runs: feed
//! notifications by hand, script establish/write/invoke outcomes, and
//! observe everything the engine submitted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use tagbind_types::{
    InvokeResult, InvokeSpec, StatusCode, TransportError, ValueNotification, WriteResult,
    WriteSpec,
};

use crate::domain::binding::{MonitoredInterest, SubscriptionSpec};
use crate::ports::{SubscriptionTransport, TransportSession, NOTIFICATION_CHANNEL_CAPACITY};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable in-memory transport.
///
/// All operations succeed by default; behavior is adjusted with the
/// builder-style `with_*` methods before the transport is shared.
pub struct InMemoryTransport {
    /// Sender half of the current session, if one is established.
    session_tx: Mutex<Option<mpsc::Sender<ValueNotification>>>,

    /// Interests registered by the most recent establish.
    registered: Mutex<Vec<MonitoredInterest>>,

    /// Writes received, in submission order.
    writes: Mutex<Vec<WriteSpec>>,

    /// Invokes received, in submission order.
    invokes: Mutex<Vec<InvokeSpec>>,

    /// Establish calls observed.
    establish_count: AtomicUsize,

    /// Scripted establish failures still to serve.
    establish_failures: AtomicUsize,

    /// Scripted write outcome.
    write_error: Option<TransportError>,

    /// Scripted invoke outcome.
    invoke_error: Option<TransportError>,

    /// Scripted invoke result on success.
    invoke_result: InvokeResult,

    /// Artificial invoke latency (for overlap assertions).
    invoke_latency: Duration,

    /// Invokes currently in flight.
    in_flight_invokes: AtomicUsize,

    /// Peak concurrent invokes observed.
    max_in_flight_invokes: AtomicUsize,
}

impl InMemoryTransport {
    /// Create a transport where every operation succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_tx: Mutex::new(None),
            registered: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            invokes: Mutex::new(Vec::new()),
            establish_count: AtomicUsize::new(0),
            establish_failures: AtomicUsize::new(0),
            write_error: None,
            invoke_error: None,
            invoke_result: InvokeResult {
                status: StatusCode::GOOD,
                output_arguments: Vec::new(),
            },
            invoke_latency: Duration::ZERO,
            in_flight_invokes: AtomicUsize::new(0),
            max_in_flight_invokes: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` establish calls with a connection fault.
    #[must_use]
    pub fn with_establish_failures(self, count: usize) -> Self {
        self.establish_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Fail every write with the given error.
    #[must_use]
    pub fn with_write_error(mut self, error: TransportError) -> Self {
        self.write_error = Some(error);
        self
    }

    /// Fail every invoke with the given error.
    #[must_use]
    pub fn with_invoke_error(mut self, error: TransportError) -> Self {
        self.invoke_error = Some(error);
        self
    }

    /// Answer every invoke with the given result.
    #[must_use]
    pub fn with_invoke_result(mut self, result: InvokeResult) -> Self {
        self.invoke_result = result;
        self
    }

    /// Hold every invoke in flight for the given duration.
    #[must_use]
    pub fn with_invoke_latency(mut self, latency: Duration) -> Self {
        self.invoke_latency = latency;
        self
    }

    /// Feed a notification into the current session.
    ///
    /// Returns `false` when no session is established or the session
    /// buffer is full.
    pub fn push(&self, notification: ValueNotification) -> bool {
        match lock(&self.session_tx).as_ref() {
            Some(tx) => tx.try_send(notification).is_ok(),
            None => false,
        }
    }

    /// Drop the current session's sender, closing the notification
    /// channel. The lifecycle observes this as a fault.
    pub fn fault(&self) {
        lock(&self.session_tx).take();
    }

    /// Interests registered by the most recent establish.
    #[must_use]
    pub fn registered_interests(&self) -> Vec<MonitoredInterest> {
        lock(&self.registered).clone()
    }

    /// Writes received so far.
    #[must_use]
    pub fn writes(&self) -> Vec<WriteSpec> {
        lock(&self.writes).clone()
    }

    /// Invokes received so far.
    #[must_use]
    pub fn invokes(&self) -> Vec<InvokeSpec> {
        lock(&self.invokes).clone()
    }

    /// Number of establish calls observed.
    #[must_use]
    pub fn establish_count(&self) -> usize {
        self.establish_count.load(Ordering::SeqCst)
    }

    /// Peak concurrent invokes observed.
    #[must_use]
    pub fn max_concurrent_invokes(&self) -> usize {
        self.max_in_flight_invokes.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionTransport for InMemoryTransport {
    async fn establish(
        &self,
        _spec: &SubscriptionSpec,
        interests: &[MonitoredInterest],
    ) -> Result<TransportSession, TransportError> {
        self.establish_count.fetch_add(1, Ordering::SeqCst);

        let scripted_failure = self
            .establish_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(TransportError::ConnectionLost(
                "scripted establish failure".to_string(),
            ));
        }

        *lock(&self.registered) = interests.to_vec();

        let (tx, rx) = mpsc::channel(NOTIFICATION_CHANNEL_CAPACITY);
        *lock(&self.session_tx) = Some(tx);

        Ok(TransportSession { notifications: rx })
    }

    async fn write(&self, requests: &[WriteSpec]) -> Result<Vec<WriteResult>, TransportError> {
        lock(&self.writes).extend_from_slice(requests);

        if let Some(error) = &self.write_error {
            return Err(error.clone());
        }

        Ok(requests
            .iter()
            .map(|_| WriteResult {
                status: StatusCode::GOOD,
            })
            .collect())
    }

    async fn invoke(&self, spec: &InvokeSpec) -> Result<InvokeResult, TransportError> {
        lock(&self.invokes).push(spec.clone());

        let in_flight = self.in_flight_invokes.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_invokes
            .fetch_max(in_flight, Ordering::SeqCst);

        if !self.invoke_latency.is_zero() {
            tokio::time::sleep(self.invoke_latency).await;
        }

        self.in_flight_invokes.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = &self.invoke_error {
            return Err(error.clone());
        }
        Ok(self.invoke_result.clone())
    }
}
