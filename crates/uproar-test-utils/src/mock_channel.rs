// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and captured outbound messages for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use uproar_core::error::UproarError;
use uproar_core::traits::{ChannelAdapter, PluginAdapter};
use uproar_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageContent, MessageId,
    OutboundMessage,
};

/// A mock messaging channel for testing.
///
/// Provides two queues:
/// - **inbound**: messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured and retrievable via `sent_messages()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    notify: Arc<Notify>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Inject an inbound message; the next `receive()` call returns it.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Inject a plain text message from `sender` in `conversation`.
    pub async fn inject_text(&self, conversation: &str, sender: &str, text: &str) {
        self.inject_message(build_inbound(
            conversation,
            sender,
            MessageContent::Text(text.to_string()),
        ))
        .await;
    }

    /// Inject a button tap: `action` plus its parameters.
    pub async fn inject_callback(
        &self,
        conversation: &str,
        sender: &str,
        action: &str,
        params: &[&str],
    ) {
        self.inject_message(build_inbound(
            conversation,
            sender,
            MessageContent::Callback {
                action: action.to_string(),
                params: params.iter().map(|p| p.to_string()).collect(),
            },
        ))
        .await;
    }

    /// All messages captured by `send()`, in order.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

/// Builds an inbound message the way a real channel would.
pub fn build_inbound(conversation: &str, sender: &str, content: MessageContent) -> InboundMessage {
    InboundMessage {
        id: format!("mock-{}", uuid::Uuid::new_v4()),
        conversation_id: conversation.to_string(),
        channel: "mock".to_string(),
        sender_id: sender.to_string(),
        sender_name: Some(sender.to_string()),
        content,
        timestamp: chrono::Utc::now().to_rfc3339(),
        metadata: None,
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, UproarError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), UproarError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_buttons: true,
            supports_edit: false,
            supports_typing: false,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), UproarError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, UproarError> {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, UproarError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            // notify_one() stores a permit, so an inject between the check
            // above and this await is not lost.
            self.notify.notified().await;
        }
    }
}
