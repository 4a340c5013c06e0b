// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop and message dispatch for the Uproar engagement agent.
//!
//! The [`AgentLoop`] receives messages from a channel adapter (usually the
//! [`channel_mux::ChannelMultiplexer`]) and fans them out to lazily created
//! per-conversation lanes, so one slow conversation never blocks another
//! and messages within a conversation stay ordered.
//!
//! Each lane runs the [`Dispatcher`]: gate, context, and classification via
//! the pipeline, then session touch, then routing. Button callbacks and
//! bang-commands act on the raid coordinator and leaderboard; everything
//! else earns a conversational reply. All replies leave through one
//! outbound queue that a pump task drains into the channel adapter.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use uproar_config::model::UproarConfig;
use uproar_core::error::UproarError;
use uproar_core::traits::ChannelAdapter;
use uproar_core::types::{Button, InboundMessage, MessageContent, OutboundMessage};
use uproar_leaderboard::{LeaderboardEngine, StandingsWindow};
use uproar_pipeline::{HistoryEntry, Intent, Pipeline, PipelineOutcome};
use uproar_raid::{CreateOutcome, JoinOutcome, RaidCoordinator};
use uproar_session::{SessionManager, TouchOutcome};

pub mod channel_mux;
pub mod commands;
pub mod replies;
pub mod runners;
pub mod shutdown;

pub use channel_mux::ChannelMultiplexer;
pub use commands::RaidCommand;

/// Messages of context kept per conversation for ambient signals.
const HISTORY_KEEP: usize = 50;

/// Rows shown by the standings command.
const STANDINGS_LIMIT: usize = 10;

/// Queue depth of one conversation lane.
const LANE_DEPTH: usize = 64;

struct DispatchInner {
    config: UproarConfig,
    pipeline: Pipeline,
    sessions: Arc<SessionManager>,
    coordinator: RaidCoordinator,
    leaderboard: Arc<LeaderboardEngine>,
    outbound: mpsc::Sender<OutboundMessage>,
    /// Recent messages per conversation, oldest first.
    histories: Mutex<HashMap<String, VecDeque<HistoryEntry>>>,
    /// Conversation id to the channel its messages arrive on, for pushes
    /// that originate outside an inbound message (raid broadcasts).
    routes: Mutex<HashMap<String, String>>,
}

/// Stateless-per-message handler shared by every conversation lane.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatchInner>,
}

impl Dispatcher {
    pub fn new(
        config: UproarConfig,
        pipeline: Pipeline,
        sessions: Arc<SessionManager>,
        coordinator: RaidCoordinator,
        leaderboard: Arc<LeaderboardEngine>,
        outbound: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatchInner {
                config,
                pipeline,
                sessions,
                coordinator,
                leaderboard,
                outbound,
                histories: Mutex::new(HashMap::new()),
                routes: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Run one inbound message through gate, session, and routing.
    ///
    /// Never returns an error: refusals are normal outcomes and internal
    /// failures degrade to a logged apology reply.
    pub async fn dispatch(&self, msg: InboundMessage) {
        let conversation_id = msg.conversation_id.clone();
        let channel = msg.channel.clone();
        self.inner
            .routes
            .lock()
            .await
            .insert(conversation_id.clone(), channel.clone());

        let raid_active = self
            .inner
            .coordinator
            .active_campaign_for(&conversation_id)
            .await
            .is_some();
        let history: Vec<HistoryEntry> = {
            let histories = self.inner.histories.lock().await;
            histories
                .get(&conversation_id)
                .map(|h| h.iter().cloned().collect())
                .unwrap_or_default()
        };

        let outcome = self
            .inner
            .pipeline
            .process(&msg, &history, raid_active, Utc::now());

        let (bag, classification) = match outcome {
            PipelineOutcome::Refused { reply, .. } => {
                if let Some(text) = reply {
                    self.send_text(&conversation_id, &channel, text).await;
                }
                return;
            }
            PipelineOutcome::Classified {
                bag,
                classification,
                ..
            } => (bag, classification),
        };

        match self.inner.sessions.touch(&conversation_id, &channel).await {
            Ok(TouchOutcome::Created { session_id }) => {
                uproar_telemetry::record_session_opened();
                uproar_telemetry::set_active_sessions(
                    self.inner.sessions.active_count().await as f64,
                );
                debug!(session_id, conversation_id, "session created");
            }
            Ok(TouchOutcome::Touched { .. }) => {}
            Err(UproarError::Capacity { .. }) => {
                warn!(conversation_id, "session table at capacity");
                self.send_text(&conversation_id, &channel, replies::capacity())
                    .await;
                return;
            }
            Err(e) => {
                error!(error = %e, conversation_id, "session touch failed");
                self.send_text(&conversation_id, &channel, replies::internal_error())
                    .await;
                return;
            }
        }

        if !bag.text.is_empty() {
            let mut histories = self.inner.histories.lock().await;
            let entries = histories.entry(conversation_id.clone()).or_default();
            entries.push_back(HistoryEntry::new(&msg.sender_id, &bag.text));
            while entries.len() > HISTORY_KEEP {
                entries.pop_front();
            }
        }

        // Operational routing first: button taps and bang-commands act on
        // the raid machinery; everything else is conversational.
        if let MessageContent::Callback { action, params } = &msg.content {
            match commands::from_callback(action, params) {
                Some(cmd) => self.run_command(&msg, cmd).await,
                None => debug!(action, "ignoring unknown callback action"),
            }
            return;
        }
        if let Some(parsed) = &bag.command {
            match commands::from_parsed(parsed) {
                Some(cmd) => self.run_command(&msg, cmd).await,
                None => {
                    self.send_text(&conversation_id, &channel, replies::unknown_command())
                        .await;
                }
            }
            return;
        }

        self.converse(&msg, classification.intent).await;
    }

    async fn run_command(&self, msg: &InboundMessage, cmd: RaidCommand) {
        let conversation_id = msg.conversation_id.as_str();
        let channel = msg.channel.as_str();
        let display_name = msg
            .sender_name
            .clone()
            .unwrap_or_else(|| msg.sender_id.clone());

        match cmd {
            RaidCommand::Create {
                target,
                duration_minutes,
            } => {
                let result = self
                    .inner
                    .coordinator
                    .create(
                        conversation_id,
                        &target,
                        duration_minutes,
                        self.inner.config.scoring.clone(),
                    )
                    .await;
                match result {
                    Ok(outcome) => {
                        let text = replies::create_outcome(&outcome, &target);
                        let buttons = match &outcome {
                            CreateOutcome::Created { campaign_id, .. }
                            | CreateOutcome::AlreadyRunning { campaign_id } => {
                                Some(join_button(campaign_id))
                            }
                            CreateOutcome::InvalidDuration { .. } => None,
                        };
                        self.send_with_buttons(conversation_id, channel, text, buttons)
                            .await;
                    }
                    Err(e) => {
                        error!(error = %e, "raid create failed");
                        self.send_text(conversation_id, channel, replies::internal_error())
                            .await;
                    }
                }
            }
            RaidCommand::Join { campaign_id } => {
                let campaign_id = match campaign_id {
                    Some(id) => Some(id),
                    None => {
                        self.inner
                            .coordinator
                            .active_campaign_for(conversation_id)
                            .await
                    }
                };
                let Some(campaign_id) = campaign_id else {
                    self.send_text(
                        conversation_id,
                        channel,
                        replies::join_outcome(&JoinOutcome::NotFound),
                    )
                    .await;
                    return;
                };
                match self
                    .inner
                    .coordinator
                    .join(&campaign_id, &msg.sender_id, &display_name)
                    .await
                {
                    Ok(outcome) => {
                        let buttons = matches!(outcome, JoinOutcome::Joined { .. })
                            .then(|| action_buttons(&campaign_id));
                        self.send_with_buttons(
                            conversation_id,
                            channel,
                            replies::join_outcome(&outcome),
                            buttons,
                        )
                        .await;
                    }
                    Err(e) => {
                        error!(error = %e, "raid join failed");
                        self.send_text(conversation_id, channel, replies::internal_error())
                            .await;
                    }
                }
            }
            RaidCommand::Done {
                campaign_id,
                action,
            } => {
                let campaign_id = match campaign_id {
                    Some(id) => Some(id),
                    None => {
                        self.inner
                            .coordinator
                            .active_campaign_for(conversation_id)
                            .await
                    }
                };
                let Some(campaign_id) = campaign_id else {
                    self.send_text(conversation_id, channel, "No active raid here.")
                        .await;
                    return;
                };
                match self
                    .inner
                    .coordinator
                    .record_completion(&campaign_id, &msg.sender_id, action)
                    .await
                {
                    Ok(outcome) => {
                        self.send_text(
                            conversation_id,
                            channel,
                            replies::completion_outcome(action, &outcome),
                        )
                        .await;
                    }
                    Err(e) => {
                        error!(error = %e, "completion claim failed");
                        self.send_text(conversation_id, channel, replies::internal_error())
                            .await;
                    }
                }
            }
            RaidCommand::Standings { window } => {
                self.send_standings(conversation_id, channel, window).await;
            }
            RaidCommand::Help => {
                self.send_text(conversation_id, channel, replies::help())
                    .await;
            }
            RaidCommand::Usage(line) => {
                self.send_text(conversation_id, channel, line).await;
            }
        }
    }

    async fn send_standings(
        &self,
        conversation_id: &str,
        channel: &str,
        window: StandingsWindow,
    ) {
        match self
            .inner
            .leaderboard
            .standings(window, Some(STANDINGS_LIMIT))
            .await
        {
            Ok(standings) => {
                self.send_text(conversation_id, channel, replies::standings(&standings))
                    .await;
            }
            Err(e) => {
                error!(error = %e, "standings query failed");
                self.send_text(conversation_id, channel, replies::internal_error())
                    .await;
            }
        }
    }

    /// Reply to an admitted message that carried no command.
    async fn converse(&self, msg: &InboundMessage, intent: Intent) {
        let conversation_id = msg.conversation_id.as_str();
        let channel = msg.channel.as_str();

        // Raid chatter during a live campaign gets the live picture.
        if intent == Intent::RaidCoordination
            && let Some(progress) = self
                .inner
                .coordinator
                .active_progress_for(conversation_id)
                .await
        {
            self.send_with_buttons(
                conversation_id,
                channel,
                replies::progress_line(&progress),
                Some(join_button(&progress.campaign_id)),
            )
            .await;
            return;
        }

        self.send_text(conversation_id, channel, replies::intent_reply(intent))
            .await;
    }

    pub(crate) async fn send_text(
        &self,
        conversation_id: &str,
        channel: &str,
        text: impl Into<String>,
    ) {
        self.send_out(OutboundMessage::text(conversation_id, channel, text))
            .await;
    }

    async fn send_with_buttons(
        &self,
        conversation_id: &str,
        channel: &str,
        text: impl Into<String>,
        buttons: Option<Vec<Vec<Button>>>,
    ) {
        let mut out = OutboundMessage::text(conversation_id, channel, text);
        out.buttons = buttons;
        self.send_out(out).await;
    }

    pub(crate) async fn send_out(&self, msg: OutboundMessage) {
        if self.inner.outbound.send(msg).await.is_err() {
            warn!("outbound queue closed, dropping message");
        }
    }

    /// Channel a conversation was last seen on.
    pub(crate) async fn route_for(&self, conversation_id: &str) -> Option<String> {
        self.inner.routes.lock().await.get(conversation_id).cloned()
    }
}

/// Builds the Join button row for a campaign.
fn join_button(campaign_id: &str) -> Vec<Vec<Button>> {
    vec![vec![Button {
        label: "Join".to_string(),
        action_token: format!("raid:join:{campaign_id}"),
    }]]
}

/// Quick-claim buttons offered right after joining.
fn action_buttons(campaign_id: &str) -> Vec<Vec<Button>> {
    vec![vec![
        Button {
            label: "Repost done".to_string(),
            action_token: format!("raid:done:{campaign_id}:repost"),
        },
        Button {
            label: "Like done".to_string(),
            action_token: format!("raid:done:{campaign_id}:like"),
        },
        Button {
            label: "Reply done".to_string(),
            action_token: format!("raid:done:{campaign_id}:reply"),
        },
    ]]
}

/// Receives from the channel adapter and fans out to conversation lanes.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    dispatcher: Dispatcher,
    lanes: HashMap<String, mpsc::Sender<InboundMessage>>,
}

impl AgentLoop {
    pub fn new(channel: Arc<dyn ChannelAdapter + Send + Sync>, dispatcher: Dispatcher) -> Self {
        Self {
            channel,
            dispatcher,
            lanes: HashMap::new(),
        }
    }

    /// Run until the cancellation token fires or the channel closes.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), UproarError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => self.route_to_lane(inbound).await,
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        info!("agent loop stopped");
        Ok(())
    }

    /// Queue a message onto its conversation lane, creating the lane on
    /// first contact. Lane order preserves per-conversation ordering.
    async fn route_to_lane(&mut self, msg: InboundMessage) {
        let conversation_id = msg.conversation_id.clone();
        let lane = self.lanes.entry(conversation_id.clone()).or_insert_with(|| {
            let (tx, mut rx) = mpsc::channel::<InboundMessage>(LANE_DEPTH);
            let dispatcher = self.dispatcher.clone();
            let lane_id = conversation_id.clone();
            tokio::spawn(async move {
                while let Some(next) = rx.recv().await {
                    dispatcher.dispatch(next).await;
                }
                debug!(conversation_id = lane_id, "conversation lane closed");
            });
            tx
        });

        if lane.send(msg).await.is_err() {
            warn!(conversation_id, "conversation lane gone, dropping message");
            self.lanes.remove(&conversation_id);
        }
    }
}
