//! # TagBind Demo Runtime
//!
//! Wires the binding engine against the simulated plant transport:
//! loads the TOML configuration, observes the state model for a few
//! seconds, issues a mode write and a multiply invoke, then shuts
//! down cleanly.
//!
//! ## Usage
//!
//! ```bash
//! tagbind                 # embedded default configuration
//! tagbind my-plant.toml   # explicit configuration file
//! TAGBIND_LOG=debug tagbind
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use tagbind_bus::{EventFilter, StateEvent};
use tagbind_engine::BindingEngine;
use tagbind_runtime::{init_logging, RuntimeConfig, SimulatedPlantTransport};
use tagbind_types::{HandOffAuto, InvokeSpec, MemberId, NodeAddress, WriteSpec};

const DEFAULT_CONFIG: &str = include_str!("../tagbind.toml");

/// How long the demo observes the model before issuing commands.
const OBSERVE_FOR: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("===========================================");
    info!("  TagBind Runtime v0.1.0");
    info!("===========================================");

    let config_text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {path}"))?,
        None => DEFAULT_CONFIG.to_string(),
    };
    let config =
        RuntimeConfig::from_toml_str(&config_text).context("failed to parse configuration")?;
    let model = config.into_model().context("invalid binding configuration")?;

    let transport = Arc::new(SimulatedPlantTransport::new());
    let engine =
        BindingEngine::build(model, transport).context("failed to assemble binding engine")?;

    let mut events = engine.bus().subscribe(EventFilter::all());
    engine.start();

    // Observe the model for a few seconds.
    let deadline = tokio::time::Instant::now() + OBSERVE_FOR;
    while let Ok(delivered) = tokio::time::timeout_at(deadline, events.recv()).await {
        let Some(event) = delivered else {
            break;
        };
        match event {
            StateEvent::ScalarChanged { member, value } => {
                info!(%member, value = %value.value, "scalar changed");
            }
            StateEvent::HistoryAppended { member } => {
                debug!(%member, "history appended");
            }
            StateEvent::ConnectionStateChanged { state } => {
                info!(%state, "connection state");
            }
        }
    }

    // Command the plant: switch to automatic, then multiply.
    let gateway = engine.gateway();

    let write_results = gateway
        .write(vec![WriteSpec::scalar(
            NodeAddress::string(2, "Robot1_Mode"),
            HandOffAuto::Auto,
        )])
        .await
        .context("mode write failed")?;
    if let Some(result) = write_results.first() {
        info!(status = %result.status, "mode write acknowledged");
    }

    let invoke_result = gateway
        .invoke(
            InvokeSpec::new(
                NodeAddress::string(2, "Robot1"),
                NodeAddress::string(2, "Robot1_Multiply"),
            )
            .arg(6.0f64)
            .arg(7.0f64),
        )
        .await
        .context("multiply invoke failed")?;
    if let Some(product) = invoke_result.output_arguments.first() {
        info!(%product, "multiply returned");
    }

    // Final snapshot of the observable model.
    let store = engine.store();
    if let Some(mode) = store.scalar(&MemberId::new("robot1_mode")) {
        info!(value = %mode.value, "final mode reading");
    }
    if let Some(history) = store.history_snapshot(&MemberId::new("robot1_axis1_history")) {
        info!(samples = history.len(), "axis1 history collected");
    }
    if let Some(alarms) = store.live_events(&MemberId::new("robot1_events")) {
        info!(live = alarms.len(), "alarms currently displayed");
    }
    info!(
        routed = engine.router_metrics().notifications_routed(),
        coalesced = engine.router_metrics().scalar_coalesced(),
        "router totals"
    );

    engine.shutdown().await;
    info!("shut down cleanly");
    Ok(())
}
