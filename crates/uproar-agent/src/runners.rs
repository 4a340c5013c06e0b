// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background loops spawned alongside the agent loop.
//!
//! Three tasks run for the life of the process and stop on cancellation:
//! the outbound pump drains the shared reply queue into the channel
//! adapter, the raid event pump turns coordinator events into chat
//! pushes, and the maintenance loop sweeps sessions and idle gate state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use uproar_core::traits::ChannelAdapter;
use uproar_core::types::OutboundMessage;
use uproar_raid::RaidEvent;
use uproar_session::SessionEvent;

use crate::{Dispatcher, replies};

/// Gate state for senders quiet longer than this is dropped.
const SENDER_IDLE_LIMIT: Duration = Duration::from_secs(3600);

/// Drain the outbound queue into the channel adapter.
///
/// A failed send is logged and skipped; one unreachable channel must not
/// wedge replies for everyone else.
pub async fn run_outbound_pump(
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    mut outbound: mpsc::Receiver<OutboundMessage>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            msg = outbound.recv() => {
                let Some(msg) = msg else {
                    debug!("outbound queue closed");
                    break;
                };
                let channel_name = msg.channel.clone();
                match channel.send(msg).await {
                    Ok(_) => uproar_telemetry::record_outbound(&channel_name),
                    Err(e) => {
                        warn!(
                            error = %e,
                            channel = %channel_name,
                            "outbound send failed, message skipped"
                        );
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
    debug!("outbound pump stopped");
}

/// Turn raid coordinator events into conversation pushes.
pub async fn run_raid_events(
    dispatcher: Dispatcher,
    mut events: mpsc::Receiver<RaidEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => forward_raid_event(&dispatcher, event).await,
                    None => {
                        debug!("raid event channel closed");
                        break;
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
    debug!("raid event pump stopped");
}

async fn forward_raid_event(dispatcher: &Dispatcher, event: RaidEvent) {
    match event {
        RaidEvent::StatusBroadcast(progress) => {
            let Some(channel) = dispatcher.route_for(&progress.conversation_id).await else {
                warn!(
                    conversation_id = %progress.conversation_id,
                    "no route for raid broadcast, skipping"
                );
                return;
            };
            let text = replies::progress_line(&progress);
            let mut out = OutboundMessage::text(progress.conversation_id.clone(), channel, text);
            out.buttons = Some(crate::join_button(&progress.campaign_id));
            dispatcher.send_out(out).await;
        }
        RaidEvent::Completed {
            conversation_id,
            summary,
        } => {
            let Some(channel) = dispatcher.route_for(&conversation_id).await else {
                warn!(conversation_id = %conversation_id, "no route for raid summary, skipping");
                return;
            };
            let text = replies::summary(&summary);
            dispatcher
                .send_out(OutboundMessage::text(conversation_id, channel, text))
                .await;
        }
        RaidEvent::Cancelled {
            conversation_id,
            target,
            ..
        } => {
            let Some(channel) = dispatcher.route_for(&conversation_id).await else {
                warn!(conversation_id = %conversation_id, "no route for raid notice, skipping");
                return;
            };
            dispatcher
                .send_out(OutboundMessage::text(
                    conversation_id,
                    channel,
                    replies::cancelled(&target),
                ))
                .await;
        }
    }
}

/// Periodic housekeeping: session sweep with expiry warnings, the active
/// session gauge, and idle gate state cleanup.
pub async fn run_maintenance(dispatcher: Dispatcher, cancel: CancellationToken) {
    let every = Duration::from_secs(
        dispatcher
            .inner
            .config
            .session
            .sweep_interval_secs
            .max(1),
    );
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in dispatcher.inner.sessions.sweep().await {
                    match event {
                        SessionEvent::ExpiringSoon(summary) => {
                            let minutes = (summary.expires_at - Utc::now()).num_minutes();
                            dispatcher
                                .send_text(
                                    &summary.conversation_id,
                                    &summary.channel,
                                    replies::session_expiring(minutes),
                                )
                                .await;
                        }
                        SessionEvent::Expired(summary) => {
                            uproar_telemetry::record_session_closed("expired");
                            debug!(
                                conversation_id = %summary.conversation_id,
                                messages = summary.message_count,
                                "session expired"
                            );
                        }
                    }
                }
                uproar_telemetry::set_active_sessions(
                    dispatcher.inner.sessions.active_count().await as f64,
                );
                let dropped = dispatcher.inner.pipeline.sweep_idle(SENDER_IDLE_LIMIT);
                if dropped > 0 {
                    debug!(dropped, "idle gate senders swept");
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
    debug!("maintenance loop stopped");
}
