// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Uproar engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a message, assigned by the channel that delivered it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the plugin surface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Verifier,
    Storage,
}

/// The payload of an inbound message.
///
/// `Callback` is the synthetic kind a channel produces when a user activates
/// a button: the opaque action token is split back into an action name and
/// its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Callback { action: String, params: Vec<String> },
}

impl MessageContent {
    /// The text of a `Text` payload, or `None` for callbacks.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t) => Some(t),
            MessageContent::Callback { .. } => None,
        }
    }
}

/// An inbound message received from a channel adapter.
///
/// Immutable once received; every pipeline stage reads it by reference.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Channel-assigned message identifier.
    pub id: String,
    /// The conversation (group, room, DM) the message arrived in.
    pub conversation_id: String,
    /// Name of the channel adapter that delivered the message.
    pub channel: String,
    /// Platform identity of the sender.
    pub sender_id: String,
    /// Display name of the sender, when the platform provides one.
    pub sender_name: Option<String>,
    /// Message payload.
    pub content: MessageContent,
    /// RFC 3339 arrival timestamp.
    pub timestamp: String,
    /// Opaque platform metadata (attachments, thread ids) passed through untouched.
    pub metadata: Option<String>,
}

/// A single interactive button on an outbound message.
///
/// `action_token` is opaque to the channel; it comes back verbatim inside a
/// [`MessageContent::Callback`] when the user presses the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action_token: String,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Target conversation.
    pub conversation_id: String,
    /// Name of the channel adapter that should deliver the message.
    pub channel: String,
    /// Message text.
    pub content: String,
    /// Optional button rows. Channels without button support render them as text.
    pub buttons: Option<Vec<Vec<Button>>>,
    /// Message id this is a reply to, if threading is supported.
    pub reply_to: Option<String>,
    /// Opaque metadata for the channel adapter.
    pub metadata: Option<String>,
}

impl OutboundMessage {
    /// A plain text message to a conversation, no buttons, no threading.
    pub fn text(conversation_id: impl Into<String>, channel: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            channel: channel.into(),
            content: content.into(),
            buttons: None,
            reply_to: None,
            metadata: None,
        }
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    /// Supports interactive button rows on outbound messages.
    pub supports_buttons: bool,
    /// Supports editing previously sent messages.
    pub supports_edit: bool,
    /// Supports typing indicators.
    pub supports_typing: bool,
    /// Maximum outbound message length, if the platform enforces one.
    pub max_message_length: Option<usize>,
}

/// The kind of external social action a participant can claim.
///
/// `Repost` is the platform-neutral retweet equivalent and carries the
/// highest default weight together with `Quote`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Repost,
    Quote,
    Reply,
    Share,
    Like,
    View,
}

/// Result returned by an engagement verifier for one claimed action.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierOutcome {
    /// Whether the claimed action was observed on the platform.
    pub verified: bool,
    /// Optional weight override reported by the verifier (e.g. amplified reach).
    /// When absent the configured base weight for the action kind applies.
    pub weight: Option<u32>,
}

impl VerifierOutcome {
    /// A verified outcome with no weight override.
    pub fn verified() -> Self {
        Self {
            verified: true,
            weight: None,
        }
    }

    /// An unverified outcome.
    pub fn unverified() -> Self {
        Self {
            verified: false,
            weight: None,
        }
    }
}

/// One persisted per-user-per-campaign result row.
///
/// Upserted by the raid coordinator on join, on each verified action, and at
/// the terminal transition; the leaderboard aggregates only these rows.
/// Keyed by `(campaign_id, user_id)`; `id` is a stable UUID assigned at the
/// first upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub id: String,
    pub campaign_id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub display_name: String,
    /// Total points the participant holds in this campaign.
    pub points: u32,
    /// Count of verified actions in this campaign.
    pub verified_actions: u32,
    /// RFC 3339 join time.
    pub joined_at: String,
    /// RFC 3339 time of the first verified completion, if any.
    pub first_verified_at: Option<String>,
    /// Campaign status when this row was last written ("active", "completed", "cancelled").
    pub campaign_status: String,
    /// RFC 3339 time of the last upsert.
    pub recorded_at: String,
}
