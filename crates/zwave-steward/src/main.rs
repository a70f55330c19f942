//! zwave-steward - keeps Z-Wave node configuration and schedules converged

use anyhow::Context;
use clap::Parser;
use reconcile_engine::{config, Config, NodeMode, ReconcileEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zwave_core::ZwaveNetwork;
use zwave_protocol::{ZwaveEvent, ZwaveTransport};

#[derive(Parser, Debug)]
#[command(version, about = "Reconcile Z-Wave node configuration through zwave-js")]
struct Cli {
    /// Node roster (TOML)
    config: PathBuf,

    /// Validate the config and print the roster without connecting
    #[arg(long)]
    check: bool,
}

fn log_roster(config: &Config) {
    tracing::info!(
        "zwave-js endpoint {} ({:?} reads), {} nodes",
        config.endpoint,
        config.read_mode,
        config.nodes.len()
    );
    for node in config.nodes.values() {
        match &node.mode {
            NodeMode::Parameters(params) => {
                for param in params.values() {
                    tracing::info!(
                        "Node {} ({}) parameter {} ({}) = {}",
                        node.id,
                        node.description,
                        param.id,
                        param.label(),
                        param.value
                    );
                }
            }
            NodeMode::Schedule { schedule, actuator } => {
                for event in schedule.events() {
                    tracing::info!(
                        "Node {} ({}) via {:?}: {} at {}",
                        node.id,
                        node.description,
                        actuator,
                        event.state,
                        event.at
                    );
                }
            }
        }
    }
}

fn log_event(event: ZwaveEvent) {
    match event.node_id {
        Some(node_id) => tracing::debug!(
            "Event {} from {} node {}: {:?}",
            event.event,
            event.source,
            node_id,
            event.args
        ),
        None => tracing::debug!("Event {} from {}: {:?}", event.event, event.source, event.args),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "zwave_steward=info,reconcile_engine=info,zwave_core=info,zwave_protocol=info,warn"
                    .into()
            }),
        )
        .init();

    let config = config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    if cli.check {
        log_roster(&config);
        tracing::info!("Config {} is valid", cli.config.display());
        return Ok(());
    }

    tracing::info!("Starting zwave-steward");

    let transport = Arc::new(
        ZwaveTransport::connect(&config.endpoint, Some(Box::new(log_event)))
            .await
            .with_context(|| format!("Failed to connect to {}", config.endpoint))?,
    );
    let network = ZwaveNetwork::new(transport.clone(), config.read_mode);

    // Report what the controller knows about each managed node
    for node_id in config.nodes.keys() {
        match network.node_state(*node_id).await {
            Ok(state) => tracing::info!(
                "Node {} ({}): {}, ready={}",
                node_id,
                state.display_name(),
                state.status(),
                state.ready
            ),
            Err(e) => tracing::warn!("Failed to query state of node {}: {}", node_id, e),
        }
    }

    let mut engine = ReconcileEngine::new(network, config.nodes, config.pacing);

    tokio::select! {
        () = engine.run() => Ok(()),
        reason = transport.closed() => {
            anyhow::bail!("zwave-js session terminated: {reason}")
        }
    }
}
