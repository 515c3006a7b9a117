//! # Subscription Lifecycle
//!
//! Owns the transport session: establishes it, pumps notifications
//! into the router while it lives, and re-establishes it after faults
//! with exponential backoff. The binding table is preserved across
//! re-establishments — the caller never re-declares anything.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use tagbind_bus::{StateEvent, StateEventBus};
use tagbind_types::ConnectionState;

use crate::domain::binding::BindingTable;
use crate::domain::router::NotificationRouter;
use crate::ports::SubscriptionTransport;

/// Re-establishment backoff: exponential, capped.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Upper bound on the delay.
    pub max: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.min(31) as i32);
        let delay = self.initial.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max.as_secs_f64()))
    }
}

/// The connection state machine.
///
/// `Unsubscribed → Establishing → Active`, `Active → Faulted →
/// Establishing` on faults, any state → `Unsubscribed` on shutdown.
pub struct SubscriptionLifecycle {
    transport: Arc<dyn SubscriptionTransport>,
    table: Arc<BindingTable>,
    router: Arc<NotificationRouter>,
    bus: Arc<StateEventBus>,
    state_tx: watch::Sender<ConnectionState>,
    retry: RetryPolicy,
    reconnect_attempts: AtomicU64,
}

impl SubscriptionLifecycle {
    /// Create a lifecycle. Returns the machine and a watch on its
    /// state.
    #[must_use]
    pub fn new(
        transport: Arc<dyn SubscriptionTransport>,
        table: Arc<BindingTable>,
        router: Arc<NotificationRouter>,
        bus: Arc<StateEventBus>,
        retry: RetryPolicy,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Unsubscribed);
        (
            Self {
                transport,
                table,
                router,
                bus,
                state_tx,
                retry,
                reconnect_attempts: AtomicU64::new(0),
            },
            state_rx,
        )
    }

    /// Number of re-establishment attempts made so far.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: ConnectionState) {
        if *self.state_tx.borrow() == state {
            return;
        }
        info!(%state, "connection state changed");
        self.state_tx.send_replace(state);
        self.bus.publish(StateEvent::ConnectionStateChanged { state });
    }

    /// Run the state machine until shutdown.
    ///
    /// Establishes the session, registers the table's interest set,
    /// and pumps notifications into the router. On a fault the machine
    /// enters `Faulted`, waits out the backoff, and establishes again
    /// with the same table. Returns once `shutdown` observes `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let interests = self.table.monitored_interests();
        let mut attempt: u32 = 0;

        'machine: while !*shutdown.borrow() {
            self.set_state(ConnectionState::Establishing);

            let established = tokio::select! {
                _ = shutdown.changed() => break 'machine,
                result = self
                    .transport
                    .establish(self.table.subscription(), &interests) => result,
            };

            match established {
                Ok(mut session) => {
                    attempt = 0;
                    self.set_state(ConnectionState::Active);

                    loop {
                        tokio::select! {
                            _ = shutdown.changed() => break 'machine,
                            delivered = session.notifications.recv() => match delivered {
                                Some(notification) => self.router.route(notification),
                                None => {
                                    error!("notification channel closed by transport");
                                    break;
                                }
                            },
                        }
                    }

                    self.set_state(ConnectionState::Faulted);
                }
                Err(fault) => {
                    error!(error = %fault, "failed to establish subscription");
                    self.set_state(ConnectionState::Faulted);
                }
            }

            self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
            let delay = self.retry.delay(attempt);
            attempt = attempt.saturating_add(1);
            debug!(?delay, attempt, "retrying subscription establishment");

            tokio::select! {
                _ = shutdown.changed() => break 'machine,
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(ConnectionState::Unsubscribed);
    }
}
