// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Uproar engagement engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types shared across the Uproar workspace: the message vocabulary,
//! the engagement record row, and the channel / verifier / storage ports.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::UproarError;
pub use types::{
    ActionKind, AdapterType, Button, ChannelCapabilities, EngagementRecord, HealthStatus,
    InboundMessage, MessageContent, MessageId, OutboundMessage, VerifierOutcome,
};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, EngagementVerifier, PluginAdapter, RecordStore};
