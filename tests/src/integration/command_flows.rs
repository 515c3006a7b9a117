//! # Command Flows
//!
//! Writes and invokes through the gateway: ordering, failure
//! isolation, and independence from the inbound stream.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use tagbind_engine::{BindingEngine, BindingModel, InMemoryTransport};
    use tagbind_types::{
        ConnectionState, DataValue, HandOffAuto, InvokeResult, InvokeSpec, ItemAddress, MemberId,
        NodeAddress, StatusCode, TransportError, ValueNotification, Variant, WriteSpec,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn model() -> BindingModel {
        BindingModel::new("opc.tcp://localhost:26543", Duration::from_millis(250), 20)
            .scalar("robot1_mode", "ns=2;s=Robot1_Mode")
    }

    async fn active_engine(transport: Arc<InMemoryTransport>) -> BindingEngine {
        let engine = BindingEngine::build(model(), transport).expect("valid model");
        engine.start();
        let mut state = engine.connection_state();
        timeout(
            Duration::from_secs(1),
            state.wait_for(|s| *s == ConnectionState::Active),
        )
        .await
        .expect("never active")
        .expect("state channel closed");
        engine
    }

    fn mode_write(mode: HandOffAuto) -> WriteSpec {
        WriteSpec::scalar(NodeAddress::string(2, "Robot1_Mode"), mode)
    }

    fn multiply(a: f64, b: f64) -> InvokeSpec {
        InvokeSpec::new(
            NodeAddress::string(2, "Robot1"),
            NodeAddress::string(2, "Robot1_Multiply"),
        )
        .arg(a)
        .arg(b)
    }

    // =============================================================================
    // WRITES
    // =============================================================================

    /// A successful batch returns one good result per request, in
    /// request order.
    #[tokio::test]
    async fn test_write_results_are_positional() {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = active_engine(transport.clone()).await;

        let requests = vec![
            mode_write(HandOffAuto::Off),
            mode_write(HandOffAuto::Hand),
            mode_write(HandOffAuto::Auto),
        ];
        let results = engine
            .gateway()
            .write(requests.clone())
            .await
            .expect("write succeeds");

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|result| result.is_good()));
        assert_eq!(transport.writes(), requests);

        engine.shutdown().await;
    }

    /// A failing write surfaces a typed error to the caller and
    /// leaves the local model untouched.
    #[tokio::test]
    async fn test_write_failure_leaves_state_unchanged() {
        let transport =
            Arc::new(InMemoryTransport::new().with_write_error(TransportError::Timeout));
        let engine = active_engine(transport.clone()).await;

        let before = engine.store().scalar(&MemberId::new("robot1_mode"));
        let result = engine.gateway().write(vec![mode_write(HandOffAuto::Auto)]).await;

        assert_eq!(result, Err(TransportError::Timeout));
        assert_eq!(engine.store().scalar(&MemberId::new("robot1_mode")), before);

        engine.shutdown().await;
    }

    // =============================================================================
    // INVOKES
    // =============================================================================

    /// Output arguments come back positionally.
    #[tokio::test]
    async fn test_invoke_output_read_positionally() {
        let transport = Arc::new(InMemoryTransport::new().with_invoke_result(InvokeResult {
            status: StatusCode::GOOD,
            output_arguments: vec![Variant::Double(42.0)],
        }));
        let engine = active_engine(transport.clone()).await;

        let result = engine
            .gateway()
            .invoke(multiply(6.0, 7.0))
            .await
            .expect("invoke succeeds");
        assert_eq!(result.output_arguments[0], Variant::Double(42.0));

        engine.shutdown().await;
    }

    /// Two invokes issued together are in flight together.
    #[tokio::test]
    async fn test_concurrent_invokes_do_not_serialize() {
        let transport =
            Arc::new(InMemoryTransport::new().with_invoke_latency(Duration::from_millis(50)));
        let engine = active_engine(transport.clone()).await;
        let gateway = engine.gateway();

        let (a, b) = tokio::join!(
            gateway.invoke(multiply(2.0, 3.0)),
            gateway.invoke(multiply(4.0, 5.0))
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(transport.max_concurrent_invokes(), 2);

        engine.shutdown().await;
    }

    /// Commands flow while notifications are arriving; neither path
    /// blocks the other.
    #[tokio::test]
    async fn test_commands_and_notifications_are_independent() {
        let transport =
            Arc::new(InMemoryTransport::new().with_invoke_latency(Duration::from_millis(30)));
        let engine = active_engine(transport.clone()).await;

        let invoke = {
            let gateway = engine.gateway();
            tokio::spawn(async move { gateway.invoke(multiply(6.0, 7.0)).await })
        };

        // Notifications keep routing while the invoke is in flight.
        for i in 0..3i16 {
            assert!(transport.push(ValueNotification::new(
                ItemAddress::value(NodeAddress::string(2, "Robot1_Mode")),
                DataValue::good(i),
            )));
        }

        let store = engine.store();
        let member = MemberId::new("robot1_mode");
        timeout(Duration::from_secs(1), async {
            loop {
                if store.scalar(&member) == Some(DataValue::good(2i16)) {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("routing stalled behind the invoke");

        let result = invoke.await.expect("task").expect("invoke succeeds");
        assert!(result.status.is_good());

        engine.shutdown().await;
    }

    /// Fire-and-forget submissions drain their results; a failing one
    /// neither panics nor disturbs the engine.
    #[tokio::test]
    async fn test_fire_and_forget_failure_is_contained() {
        let transport = Arc::new(InMemoryTransport::new().with_write_error(
            TransportError::ConnectionLost("scripted".to_string()),
        ));
        let engine = active_engine(transport.clone()).await;

        engine.gateway().submit_write(vec![mode_write(HandOffAuto::Off)]);

        // The request reaches the transport and the failure is
        // absorbed by the draining task.
        timeout(Duration::from_secs(1), async {
            loop {
                if transport.writes().len() == 1 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("submission never drained");

        // The engine is still alive and routing.
        assert!(transport.push(ValueNotification::new(
            ItemAddress::value(NodeAddress::string(2, "Robot1_Mode")),
            DataValue::good(1i16),
        )));

        engine.shutdown().await;
    }
}
