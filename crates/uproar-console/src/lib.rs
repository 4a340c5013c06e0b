// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive console channel adapter for the Uproar agent.
//!
//! Implements [`ChannelAdapter`] over stdin/stdout for local development
//! and demos. Each input line becomes one inbound text message; button
//! rows on outbound messages are rendered as text with their action
//! tokens, and `/cb <token>` replays a token as a callback tap.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use uproar_config::model::ConsoleConfig;
use uproar_core::error::UproarError;
use uproar_core::traits::{ChannelAdapter, PluginAdapter};
use uproar_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageContent, MessageId,
    OutboundMessage,
};

/// Console channel adapter implementing [`ChannelAdapter`].
///
/// A background task reads stdin line by line and feeds an inbound
/// queue; `send` writes rendered messages to stdout.
pub struct ConsoleChannel {
    config: ConsoleConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    reader_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ConsoleChannel {
    pub fn new(config: ConsoleConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(100);
        Self {
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            reader_handle: None,
        }
    }
}

#[async_trait]
impl PluginAdapter for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, UproarError> {
        match &self.reader_handle {
            Some(handle) if handle.is_finished() => Ok(HealthStatus::Unhealthy(
                "console reader stopped (stdin closed?)".to_string(),
            )),
            _ => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), UproarError> {
        debug!("console channel shutting down");
        // The reader task is dropped with the adapter; for a graceful stop
        // the agent loop quits calling receive() first.
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ConsoleChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            // Buttons are rendered inline as text, not real widgets.
            supports_buttons: false,
            supports_edit: false,
            supports_typing: false,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), UproarError> {
        if self.reader_handle.is_some() {
            return Ok(()); // Already connected
        }

        let tx = self.inbound_tx.clone();
        let conversation_id = self.config.conversation_id.clone();

        info!("console channel reading from stdin");

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(content) = parse_line(&line) else {
                            if line.trim_start().starts_with("/cb") && !line.trim().is_empty() {
                                warn!("malformed callback token, expected /cb <group>:<action>[:<params>]");
                            }
                            continue;
                        };
                        let inbound = to_inbound(&conversation_id, content);
                        if tx.send(inbound).await.is_err() {
                            warn!("inbound channel closed, stopping console reader");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("console input reached end of file");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "failed to read console input");
                        break;
                    }
                }
            }
        });

        self.reader_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, UproarError> {
        println!("{}", render_outbound(&msg));
        Ok(MessageId(uuid::Uuid::new_v4().to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, UproarError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| UproarError::Channel {
            message: "console inbound channel closed".into(),
            source: None,
        })
    }
}

/// Interpret one input line. Empty lines and malformed callback tokens
/// produce nothing.
fn parse_line(line: &str) -> Option<MessageContent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(token) = trimmed.strip_prefix("/cb ") {
        return parse_callback_token(token.trim());
    }
    Some(MessageContent::Text(trimmed.to_string()))
}

/// Split a callback token on `:`. The first two segments form the action
/// (`raid:join`), the rest are parameters.
fn parse_callback_token(token: &str) -> Option<MessageContent> {
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(MessageContent::Callback {
        action: format!("{}:{}", parts[0], parts[1]),
        params: parts[2..].iter().map(|p| p.to_string()).collect(),
    })
}

fn to_inbound(conversation_id: &str, content: MessageContent) -> InboundMessage {
    InboundMessage {
        id: uuid::Uuid::new_v4().to_string(),
        conversation_id: conversation_id.to_string(),
        channel: "console".to_string(),
        sender_id: "local".to_string(),
        sender_name: None,
        content,
        timestamp: chrono::Utc::now().to_rfc3339(),
        metadata: None,
    }
}

/// Render an outbound message for a line-oriented terminal. Button rows
/// become indented lines showing the label and the token to replay.
fn render_outbound(msg: &OutboundMessage) -> String {
    let mut out = msg.content.clone();
    if let Some(rows) = &msg.buttons {
        for row in rows {
            let rendered: Vec<String> = row
                .iter()
                .map(|b| format!("[{}] /cb {}", b.label, b.action_token))
                .collect();
            out.push_str("\n  ");
            out.push_str(&rendered.join("  "));
        }
    }
    out
}
