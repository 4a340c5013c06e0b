// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal-driven shutdown.
//!
//! [`install_signal_handler`] hands out a [`CancellationToken`] that fires
//! on SIGINT or SIGTERM. The agent loop and every background runner select
//! on the same token, so one signal winds the whole process down.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Installs handlers for SIGINT (Ctrl+C) and, on unix, SIGTERM.
///
/// Returns a token cancelled when the first signal arrives. The watcher
/// task exits after cancelling.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let fired = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        fired.cancel();
        debug!("shutdown token cancelled");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, shutting down");
}
