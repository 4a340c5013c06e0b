// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel multiplexer that aggregates multiple ChannelAdapters into one.
//!
//! The multiplexer spawns per-channel receive tasks that forward inbound
//! messages to a shared mpsc channel, stamping each message with the name
//! its channel was registered under. Outbound messages route back by the
//! `channel` field.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

use uproar_core::error::UproarError;
use uproar_core::traits::{ChannelAdapter, PluginAdapter};
use uproar_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
};

/// Aggregates multiple channel adapters behind a single [`ChannelAdapter`].
///
/// On `connect()`, each child channel is connected and a background task
/// is spawned that forwards its inbound messages to a shared queue. On
/// `send()`, the outbound message is routed to the child registered under
/// the message's `channel` name.
pub struct ChannelMultiplexer {
    /// Named child channels, stored before connect().
    pending_channels: Vec<(String, Box<dyn ChannelAdapter + Send + Sync>)>,
    /// Connected child channels (moved here after connect()).
    connected_channels: Arc<Vec<(String, Arc<dyn ChannelAdapter + Send + Sync>)>>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
}

impl Default for ChannelMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelMultiplexer {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(512);
        Self {
            pending_channels: Vec::new(),
            connected_channels: Arc::new(Vec::new()),
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx,
        }
    }

    /// Add a named channel. Must be called before `connect()`; the name
    /// is what outbound messages route by.
    pub fn add_channel(&mut self, name: String, channel: Box<dyn ChannelAdapter + Send + Sync>) {
        self.pending_channels.push((name, channel));
    }

    /// Number of channels registered (pending + connected).
    pub fn channel_count(&self) -> usize {
        self.pending_channels.len() + self.connected_channels.len()
    }
}

#[async_trait]
impl PluginAdapter for ChannelMultiplexer {
    fn name(&self) -> &str {
        "multiplexer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, UproarError> {
        let mut any_unhealthy = false;
        let mut reasons = Vec::new();

        for (name, channel) in self.connected_channels.iter() {
            match channel.health_check().await? {
                HealthStatus::Healthy => {}
                HealthStatus::Degraded(reason) => {
                    reasons.push(format!("{name}: {reason}"));
                }
                HealthStatus::Unhealthy(reason) => {
                    any_unhealthy = true;
                    reasons.push(format!("{name}: {reason}"));
                }
            }
        }

        if any_unhealthy || !reasons.is_empty() {
            Ok(HealthStatus::Degraded(reasons.join("; ")))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), UproarError> {
        for (name, channel) in self.connected_channels.iter() {
            if let Err(e) = channel.shutdown().await {
                warn!(channel = %name, error = %e, "channel shutdown error");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ChannelMultiplexer {
    fn capabilities(&self) -> ChannelCapabilities {
        // Union of child capabilities; the strictest length limit wins.
        let mut caps = ChannelCapabilities {
            supports_buttons: false,
            supports_edit: false,
            supports_typing: false,
            max_message_length: None,
        };

        for (_, channel) in self.connected_channels.iter() {
            let child = channel.capabilities();
            caps.supports_buttons = caps.supports_buttons || child.supports_buttons;
            caps.supports_edit = caps.supports_edit || child.supports_edit;
            caps.supports_typing = caps.supports_typing || child.supports_typing;
            caps.max_message_length = match (caps.max_message_length, child.max_message_length) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            };
        }

        caps
    }

    async fn connect(&mut self) -> Result<(), UproarError> {
        let mut connected: Vec<(String, Arc<dyn ChannelAdapter + Send + Sync>)> = Vec::new();

        let pending = std::mem::take(&mut self.pending_channels);

        for (name, mut channel) in pending {
            channel.connect().await?;
            info!(channel = %name, "channel connected via multiplexer");

            let arc_channel: Arc<dyn ChannelAdapter + Send + Sync> = Arc::from(channel);
            connected.push((name.clone(), Arc::clone(&arc_channel)));

            let tx = self.inbound_tx.clone();
            let channel_name = name.clone();
            let recv_channel = arc_channel;

            tokio::spawn(async move {
                loop {
                    match recv_channel.receive().await {
                        Ok(mut msg) => {
                            // Stamp the registered name so replies route back.
                            msg.channel = channel_name.clone();
                            if tx.send(msg).await.is_err() {
                                // Multiplexer was dropped.
                                break;
                            }
                        }
                        Err(e) => {
                            if e.to_string().contains("closed") {
                                info!(
                                    channel = %channel_name,
                                    "channel closed, stopping receive task"
                                );
                                break;
                            }
                            warn!(
                                error = %e,
                                channel = %channel_name,
                                "channel receive error"
                            );
                        }
                    }
                }
            });
        }

        self.connected_channels = Arc::new(connected);

        info!(
            channels = self.connected_channels.len(),
            "channel multiplexer connected"
        );
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, UproarError> {
        for (name, channel) in self.connected_channels.iter() {
            if name == &msg.channel {
                return channel.send(msg).await;
            }
        }

        // A single registered channel takes everything.
        if self.connected_channels.len() == 1 {
            return self.connected_channels[0].1.send(msg).await;
        }

        Err(UproarError::Channel {
            message: format!("no channel registered as {:?}", msg.channel),
            source: None,
        })
    }

    async fn receive(&self) -> Result<InboundMessage, UproarError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| UproarError::Channel {
            message: "multiplexer inbound channel closed".to_string(),
            source: None,
        })
    }
}
