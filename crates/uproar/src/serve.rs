// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `uproar serve` command implementation.
//!
//! Starts the full Uproar agent: record store, raid coordinator, leaderboard
//! engine, session manager, admission pipeline, and the configured channel
//! adapters aggregated behind a ChannelMultiplexer. Background pumps deliver
//! outbound replies, forward raid lifecycle events, and sweep idle state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use uproar_agent::runners::{run_maintenance, run_outbound_pump, run_raid_events};
use uproar_agent::shutdown;
use uproar_agent::{AgentLoop, ChannelMultiplexer, Dispatcher};
use uproar_config::UproarConfig;
use uproar_console::ConsoleChannel;
use uproar_core::error::UproarError;
use uproar_core::ChannelAdapter;
use uproar_leaderboard::LeaderboardEngine;
use uproar_pipeline::Pipeline;
use uproar_raid::{RaidCoordinator, TrustVerifier};
use uproar_session::SessionManager;
use uproar_store::open_record_store;

/// Queue depth for raid lifecycle events awaiting broadcast.
const EVENT_QUEUE_DEPTH: usize = 256;

/// Queue depth for outbound replies awaiting channel delivery.
const OUTBOUND_QUEUE_DEPTH: usize = 512;

/// Runs the `uproar serve` command.
///
/// Wires every subsystem together, spawns the background pumps, and enters
/// the main agent loop. Supports graceful shutdown via signal handlers.
pub async fn run_serve(config: UproarConfig) -> Result<(), UproarError> {
    // Initialize tracing subscriber.
    init_tracing(&config.agent.log_level);

    info!(agent = config.agent.name.as_str(), "starting uproar serve");

    // Open the engagement record store.
    let store = open_record_store(&config.storage).await?;

    // Raid coordination core. The trust verifier accepts self-reported
    // actions; a platform-backed verifier slots in here once one exists.
    let verifier = Arc::new(TrustVerifier);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let coordinator = RaidCoordinator::new(
        config.raid.clone(),
        verifier,
        store.clone(),
        event_tx,
    );

    let leaderboard = Arc::new(LeaderboardEngine::new(store.clone()));
    let sessions = Arc::new(SessionManager::new(config.session.clone()));
    let pipeline = Pipeline::new(config.gate.clone());

    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
    let dispatcher = Dispatcher::new(
        config.clone(),
        pipeline,
        sessions,
        coordinator.clone(),
        leaderboard,
        out_tx,
    );

    // Build channel multiplexer.
    let mut mux = ChannelMultiplexer::new();

    if config.console.enabled {
        let console = ConsoleChannel::new(config.console.clone());
        mux.add_channel("console".to_string(), Box::new(console));
        info!("console channel added to multiplexer");
    } else {
        info!("console channel disabled by configuration");
    }

    if mux.channel_count() == 0 {
        warn!("no channels enabled, agent will idle until shutdown");
    }

    // Connect all channels via multiplexer.
    mux.connect().await?;
    let channel: Arc<dyn ChannelAdapter + Send + Sync> = Arc::new(mux);

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn background pumps: outbound delivery, raid event broadcasts,
    // and the session / gate maintenance sweep.
    tokio::spawn(run_outbound_pump(
        channel.clone(),
        out_rx,
        cancel.clone(),
    ));
    tokio::spawn(run_raid_events(
        dispatcher.clone(),
        event_rx,
        cancel.clone(),
    ));
    tokio::spawn(run_maintenance(dispatcher.clone(), cancel.clone()));

    // Create and run the agent loop.
    let mut agent_loop = AgentLoop::new(channel, dispatcher);
    agent_loop.run(cancel.clone()).await?;

    // Stop the pumps if the loop exited on its own (channel closed).
    cancel.cancel();
    coordinator.shutdown();
    store.close().await?;

    info!("uproar serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("UPROAR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("uproar={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
