//! # Binding Engine Facade
//!
//! Composition of the whole core: builds the table and store from a
//! declarative model, wires the router, gateway, and lifecycle, and
//! owns graceful shutdown.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use tagbind_bus::StateEventBus;
use tagbind_types::{ConfigurationError, ConnectionState};

use crate::domain::binding::{BindingModel, BindingTable};
use crate::domain::router::{NotificationRouter, RouterMetrics};
use crate::domain::state::StateStore;
use crate::ports::SubscriptionTransport;
use crate::service::gateway::CommandGateway;
use crate::service::lifecycle::{RetryPolicy, SubscriptionLifecycle};

/// The assembled binding engine.
///
/// Owns the state model exclusively; observers hold snapshot and
/// subscribe capabilities only. Built once from a declarative model —
/// there is no hot-reload of the binding table.
pub struct BindingEngine {
    table: Arc<BindingTable>,
    store: Arc<StateStore>,
    bus: Arc<StateEventBus>,
    router: Arc<NotificationRouter>,
    gateway: CommandGateway,
    lifecycle: Arc<SubscriptionLifecycle>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    run_handle: Mutex<Option<JoinHandle<()>>>,
}

impl BindingEngine {
    /// Validate a model and assemble the engine over a transport.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when the model fails
    /// validation. This is fatal: fix the declaration and rebuild.
    pub fn build(
        model: BindingModel,
        transport: Arc<dyn SubscriptionTransport>,
    ) -> Result<Self, ConfigurationError> {
        Self::build_with_retry(model, transport, RetryPolicy::default())
    }

    /// Assemble with an explicit re-establishment policy.
    ///
    /// # Errors
    ///
    /// Same contract as [`build`](BindingEngine::build).
    pub fn build_with_retry(
        model: BindingModel,
        transport: Arc<dyn SubscriptionTransport>,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigurationError> {
        let table = Arc::new(BindingTable::build(model)?);
        let store = Arc::new(StateStore::from_table(&table)?);
        let bus = Arc::new(StateEventBus::new());
        let router = Arc::new(NotificationRouter::new(
            table.clone(),
            store.clone(),
            bus.clone(),
        ));
        let gateway = CommandGateway::new(transport.clone());
        let (lifecycle, state_rx) =
            SubscriptionLifecycle::new(transport, table.clone(), router.clone(), bus.clone(), retry);
        let (shutdown_tx, _) = watch::channel(false);

        info!(
            endpoint = %table.subscription().endpoint_url,
            members = table.entries().len(),
            "binding engine assembled"
        );

        Ok(Self {
            table,
            store,
            bus,
            router,
            gateway,
            lifecycle: Arc::new(lifecycle),
            state_rx,
            shutdown_tx,
            run_handle: Mutex::new(None),
        })
    }

    /// Spawn the subscription lifecycle. Idempotent.
    pub fn start(&self) {
        let mut handle = self
            .run_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return;
        }
        let lifecycle = self.lifecycle.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        *handle = Some(tokio::spawn(async move {
            lifecycle.run(shutdown_rx).await;
        }));
    }

    /// Stop the lifecycle, wait for it to park in `Unsubscribed`, and
    /// cancel every pending event expiry.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self
            .run_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.store.close();
        info!("binding engine shut down");
    }

    /// The validated binding table.
    #[must_use]
    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    /// The observable state model.
    #[must_use]
    pub fn store(&self) -> Arc<StateStore> {
        self.store.clone()
    }

    /// The state-event bus.
    #[must_use]
    pub fn bus(&self) -> Arc<StateEventBus> {
        self.bus.clone()
    }

    /// The command gateway.
    #[must_use]
    pub fn gateway(&self) -> CommandGateway {
        self.gateway.clone()
    }

    /// Watch the connection state.
    #[must_use]
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// The router's counters.
    #[must_use]
    pub fn router_metrics(&self) -> &RouterMetrics {
        self.router.metrics()
    }

    /// Re-establishment attempts made by the lifecycle.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u64 {
        self.lifecycle.reconnect_attempts()
    }
}
