//! # Binding Flows
//!
//! Notifications flowing through the table into scalars, bounded
//! histories, and expiring event sets, observed the way a
//! presentation layer would observe them.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{advance, timeout};

    use tagbind_bus::{EventFilter, StateEvent};
    use tagbind_collections::SetEvent;
    use tagbind_engine::{BindingEngine, BindingModel, InMemoryTransport};
    use tagbind_types::{
        ConnectionState, DataValue, ItemAddress, MemberId, NodeAddress, StatusCode,
        ValueNotification,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn robot_model() -> BindingModel {
        BindingModel::new("opc.tcp://localhost:26543", Duration::from_millis(250), 20)
            .scalar("robot1_mode", "ns=2;s=Robot1_Mode")
            .history("robot1_axis1_history", "ns=2;s=Robot1_Axis1", 3)
            .events("robot1_events", "ns=2;s=Robot1", Duration::from_secs(5), Some(8))
    }

    fn axis_notification(value: f64) -> ValueNotification {
        ValueNotification::new(
            ItemAddress::value(NodeAddress::string(2, "Robot1_Axis1")),
            DataValue::good(value),
        )
    }

    fn mode_notification(value: i16) -> ValueNotification {
        ValueNotification::new(
            ItemAddress::value(NodeAddress::string(2, "Robot1_Mode")),
            DataValue::good(value),
        )
    }

    fn alarm_notification(message: &str) -> ValueNotification {
        ValueNotification::new(
            ItemAddress::event_notifier(NodeAddress::string(2, "Robot1")),
            DataValue::good(message),
        )
    }

    /// Build, start, and wait for `Active`.
    async fn active_engine(transport: Arc<InMemoryTransport>) -> BindingEngine {
        let engine = BindingEngine::build(robot_model(), transport).expect("valid model");
        engine.start();
        let mut state = engine.connection_state();
        timeout(
            Duration::from_secs(1),
            state.wait_for(|s| *s == ConnectionState::Active),
        )
        .await
        .expect("engine never became active")
        .expect("state channel closed");
        engine
    }

    // =============================================================================
    // BOUNDED HISTORY
    // =============================================================================

    /// Feed 1..5 into a capacity-3 history; the snapshot keeps the
    /// last three in order.
    #[tokio::test]
    async fn test_history_keeps_last_three_in_order() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = active_engine(transport.clone()).await;

        let mut appended = engine
            .bus()
            .subscribe(EventFilter::members(["robot1_axis1_history"]));

        for i in 1..=5 {
            assert!(transport.push(axis_notification(f64::from(i))));
        }
        for _ in 0..5 {
            let event = timeout(Duration::from_secs(1), appended.recv())
                .await
                .expect("timeout waiting for history signal")
                .expect("bus closed");
            assert!(matches!(event, StateEvent::HistoryAppended { .. }));
        }

        let snapshot = engine
            .store()
            .history_snapshot(&MemberId::new("robot1_axis1_history"))
            .expect("declared member");
        let wanted: Vec<DataValue> = (3..=5).map(|i| DataValue::good(f64::from(i))).collect();
        assert_eq!(snapshot, wanted);

        engine.shutdown().await;
    }

    // =============================================================================
    // EXPIRING EVENTS
    // =============================================================================

    /// An alarm is displayed immediately, still displayed just before
    /// its ttl, and gone just after.
    #[tokio::test(start_paused = true)]
    async fn test_alarm_present_before_ttl_absent_after() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = active_engine(transport.clone()).await;

        let member = MemberId::new("robot1_events");
        let mut set_events = engine
            .store()
            .subscribe_events(&member)
            .expect("declared member");

        assert!(transport.push(alarm_notification("overheat")));

        let added = timeout(Duration::from_secs(1), set_events.recv())
            .await
            .expect("timeout waiting for alarm")
            .expect("set channel closed");
        assert!(matches!(added, SetEvent::Added { .. }));
        assert_eq!(engine.store().live_events(&member).expect("member").len(), 1);

        advance(Duration::from_millis(4900)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(engine.store().live_events(&member).expect("member").len(), 1);

        advance(Duration::from_millis(200)).await;
        let expired = timeout(Duration::from_secs(1), set_events.recv())
            .await
            .expect("timeout waiting for expiry")
            .expect("set channel closed");
        assert!(matches!(expired, SetEvent::Expired { .. }));
        assert!(engine.store().live_events(&member).expect("member").is_empty());

        engine.shutdown().await;
    }

    /// Identical alarms delivered twice both display and both expire.
    #[tokio::test(start_paused = true)]
    async fn test_reentrant_alarms_are_distinct() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = active_engine(transport.clone()).await;

        let member = MemberId::new("robot1_events");
        let mut set_events = engine
            .store()
            .subscribe_events(&member)
            .expect("declared member");

        assert!(transport.push(alarm_notification("overheat")));
        assert!(transport.push(alarm_notification("overheat")));

        for _ in 0..2 {
            let event = timeout(Duration::from_secs(1), set_events.recv())
                .await
                .expect("timeout")
                .expect("closed");
            assert!(matches!(event, SetEvent::Added { .. }));
        }
        assert_eq!(engine.store().live_events(&member).expect("member").len(), 2);

        engine.shutdown().await;
    }

    // =============================================================================
    // SCALAR COALESCING
    // =============================================================================

    /// Redundant scalar deliveries produce no observable change;
    /// changed values produce exactly one each.
    #[tokio::test]
    async fn test_scalar_coalescing_through_the_bus() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = active_engine(transport.clone()).await;

        let mut changed = engine
            .bus()
            .subscribe(EventFilter::members(["robot1_mode"]));

        assert!(transport.push(mode_notification(1)));
        assert!(transport.push(mode_notification(1)));
        assert!(transport.push(mode_notification(2)));

        let first = timeout(Duration::from_secs(1), changed.recv())
            .await
            .expect("timeout")
            .expect("closed");
        let second = timeout(Duration::from_secs(1), changed.recv())
            .await
            .expect("timeout")
            .expect("closed");

        assert!(
            matches!(&first, StateEvent::ScalarChanged { value, .. }
                if value.value == 1i16.into())
        );
        assert!(
            matches!(&second, StateEvent::ScalarChanged { value, .. }
                if value.value == 2i16.into())
        );

        // The middle (redundant) delivery was coalesced.
        assert_eq!(engine.router_metrics().scalar_coalesced(), 1);
        assert_eq!(changed.try_recv().expect("bus open"), None);

        engine.shutdown().await;
    }

    /// An error-status reading is stored unchanged, never substituted.
    #[tokio::test]
    async fn test_bad_status_reading_reaches_the_model() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = active_engine(transport.clone()).await;

        assert!(transport.push(ValueNotification::new(
            ItemAddress::value(NodeAddress::string(2, "Robot1_Mode")),
            DataValue::with_status(0i16, StatusCode::BAD),
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
        .expect("reading never arrived");

        let stored = store.scalar(&member).expect("stored");
        assert!(stored.status.is_bad());
        assert_eq!(stored.value, 0i16.into());

        engine.shutdown().await;
    }

    /// A notification for an unbound address is a silent no-op.
    #[tokio::test]
    async fn test_unbound_address_is_dropped_silently() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = active_engine(transport.clone()).await;

        let mut all = engine.bus().subscribe(EventFilter::all());

        assert!(transport.push(ValueNotification::new(
            ItemAddress::value(NodeAddress::string(2, "Uninteresting_Item")),
            DataValue::good(99i32),
        )));

        let metrics = engine.router_metrics();
        timeout(Duration::from_secs(1), async {
            loop {
                if metrics.unbound_dropped() == 1 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("drop was never counted");

        assert_eq!(all.try_recv().expect("bus open"), None);

        engine.shutdown().await;
    }
}
