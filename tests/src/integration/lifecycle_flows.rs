//! # Lifecycle Flows
//!
//! Subscription establishment, faults and re-establishment, shutdown,
//! and the configuration file wiring the whole stack together.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use tagbind_engine::{BindingEngine, BindingModel, InMemoryTransport, RetryPolicy};
    use tagbind_runtime::RuntimeConfig;
    use tagbind_types::{
        ConnectionState, DataValue, ItemAddress, MemberId, NodeAddress, ValueNotification,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn model() -> BindingModel {
        BindingModel::new("opc.tcp://localhost:26543", Duration::from_millis(250), 20)
            .scalar("robot1_mode", "ns=2;s=Robot1_Mode")
            .events("robot1_events", "ns=2;s=Robot1", Duration::from_secs(5), Some(8))
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(50),
            multiplier: 2.0,
        }
    }

    async fn wait_for(
        engine: &BindingEngine,
        wanted: ConnectionState,
    ) {
        let mut state = engine.connection_state();
        timeout(Duration::from_secs(1), state.wait_for(|s| *s == wanted))
            .await
            .expect("timed out waiting for connection state")
            .expect("state channel closed");
    }

    // =============================================================================
    // ESTABLISHMENT & FAULTS
    // =============================================================================

    /// A transport that fails its first establishment drives
    /// Establishing → Faulted → Establishing → Active, registering the
    /// same interest set each time without the caller re-declaring
    /// anything.
    #[tokio::test]
    async fn test_reestablishment_preserves_the_binding_table() {
        let transport = Arc::new(InMemoryTransport::new().with_establish_failures(1));
        let engine =
            BindingEngine::build_with_retry(model(), transport.clone(), fast_retry())
                .expect("valid model");
        engine.start();

        wait_for(&engine, ConnectionState::Active).await;

        assert_eq!(transport.establish_count(), 2);
        assert!(engine.reconnect_attempts() >= 1);

        // The interest set registered on the successful attempt is
        // exactly what the table declares.
        let registered = transport.registered_interests();
        assert_eq!(registered, engine.table().monitored_interests());

        engine.shutdown().await;
    }

    /// A mid-session fault re-establishes automatically and traffic
    /// resumes.
    #[tokio::test]
    async fn test_fault_then_resume_routing() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = BindingEngine::build_with_retry(model(), transport.clone(), fast_retry())
            .expect("valid model");
        engine.start();

        wait_for(&engine, ConnectionState::Active).await;

        transport.fault();
        wait_for(&engine, ConnectionState::Faulted).await;
        wait_for(&engine, ConnectionState::Active).await;
        assert_eq!(transport.establish_count(), 2);

        assert!(transport.push(ValueNotification::new(
            ItemAddress::value(NodeAddress::string(2, "Robot1_Mode")),
            DataValue::good(2i16),
        )));

        let store = engine.store();
        let member = MemberId::new("robot1_mode");
        timeout(Duration::from_secs(1), async {
            loop {
                if store.scalar(&member).is_some() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("routing never resumed after the fault");

        engine.shutdown().await;
    }

    /// Shutdown parks the machine in Unsubscribed and it stays there.
    #[tokio::test]
    async fn test_shutdown_is_terminal() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = BindingEngine::build(model(), transport.clone()).expect("valid model");
        engine.start();

        wait_for(&engine, ConnectionState::Active).await;
        engine.shutdown().await;

        assert_eq!(
            *engine.connection_state().borrow(),
            ConnectionState::Unsubscribed
        );
        // No further establishment happens after shutdown.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.establish_count(), 1);
    }

    /// Shutdown cancels pending alarm expiries without firing them.
    #[tokio::test]
    async fn test_shutdown_cancels_pending_expiries() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = BindingEngine::build(model(), transport.clone()).expect("valid model");
        engine.start();
        wait_for(&engine, ConnectionState::Active).await;

        let member = MemberId::new("robot1_events");
        let mut set_events = engine
            .store()
            .subscribe_events(&member)
            .expect("declared member");

        assert!(transport.push(ValueNotification::new(
            ItemAddress::event_notifier(NodeAddress::string(2, "Robot1")),
            DataValue::good("overheat"),
        )));
        let added = timeout(Duration::from_secs(1), set_events.recv())
            .await
            .expect("timeout")
            .expect("closed");
        assert!(matches!(added, tagbind_collections::SetEvent::Added { .. }));

        engine.shutdown().await;

        // The pending 5s removal was cancelled, not fired.
        assert!(engine.store().live_events(&member).expect("member").is_empty());
        assert!(set_events.try_recv().is_err());
    }

    // =============================================================================
    // CONFIGURATION WIRING
    // =============================================================================

    /// A TOML document drives the full stack: parse, lower, build,
    /// route.
    #[tokio::test]
    async fn test_toml_config_drives_the_engine() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [subscription]
            endpoint_url = "opc.tcp://localhost:26543"
            publishing_interval_ms = 250
            keep_alive_count = 20

            [[binding]]
            member = "robot1_axis1_history"
            address = "ns=2;s=Robot1_Axis1"
            kind = "history"
            capacity = 3
            trigger = "status-value-timestamp"
            "#,
        )
        .expect("well-formed toml");
        let model = config.into_model().expect("valid configuration");

        let transport = Arc::new(InMemoryTransport::new());
        let engine = BindingEngine::build(model, transport.clone()).expect("valid model");
        engine.start();
        wait_for(&engine, ConnectionState::Active).await;

        for i in 1..=5 {
            assert!(transport.push(ValueNotification::new(
                ItemAddress::value(NodeAddress::string(2, "Robot1_Axis1")),
                DataValue::good(f64::from(i)),
            )));
        }

        let store = engine.store();
        let member = MemberId::new("robot1_axis1_history");
        timeout(Duration::from_secs(1), async {
            loop {
                let snapshot = store.history_snapshot(&member).expect("member");
                if snapshot.len() == 3 && snapshot[0] == DataValue::good(3.0f64) {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("history never converged");

        engine.shutdown().await;
    }
}
