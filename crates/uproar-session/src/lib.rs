// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session lifecycle for the Uproar engagement agent.
//!
//! [`SessionManager`] keeps one session per conversation, renews it on
//! activity, and exposes a timestamp-driven [`SessionManager::sweep`] that
//! the agent runs on an interval. Warning and expiry events come back to
//! the caller so the notification path stays outside this crate.

pub mod manager;

pub use manager::{SessionEvent, SessionManager, SessionSummary, TouchOutcome};
