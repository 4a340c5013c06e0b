// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session table and lifecycle rules.
//!
//! One canonical session exists per conversation id. A session is created
//! on the first message from a conversation, stamped on every later one,
//! and removed by the periodic sweep once its expiry passes. The table is
//! bounded; at capacity new conversations are rejected with a capacity
//! error rather than evicting someone else.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use uproar_config::model::SessionConfig;
use uproar_core::UproarError;

/// One tracked conversation session.
///
/// Owned exclusively by the [`SessionManager`]; other components see only
/// [`SessionSummary`] copies.
#[derive(Debug, Clone)]
struct Session {
    id: String,
    conversation_id: String,
    channel: String,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    renewal_count: u64,
    message_count: u64,
    warning_sent: bool,
    metadata: HashMap<String, String>,
}

/// Read-only copy of a session handed to callers and event consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub conversation_id: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub renewal_count: u64,
    pub message_count: u64,
}

impl SessionSummary {
    fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            conversation_id: session.conversation_id.clone(),
            channel: session.channel.clone(),
            created_at: session.created_at,
            expires_at: session.expires_at,
            renewal_count: session.renewal_count,
            message_count: session.message_count,
        }
    }
}

/// Result of stamping activity on a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TouchOutcome {
    /// First message from this conversation; a session was created.
    Created { session_id: String },
    /// Existing session stamped; `renewed` is true when the expiry moved.
    Touched { session_id: String, renewed: bool },
}

/// Lifecycle event produced by a sweep pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session is inside the warning threshold; emitted at most once.
    ExpiringSoon(SessionSummary),
    /// Session expired and was removed from the table.
    Expired(SessionSummary),
}

/// Tracks every live conversation session.
///
/// All mutation happens under one async mutex; the critical sections are
/// pure in-memory work, never I/O.
pub struct SessionManager {
    config: SessionConfig,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Stamp activity for a conversation, creating its session if absent.
    ///
    /// On an existing session: bumps the activity timestamp and message
    /// count, and, when auto-renew is on and the session is still inside
    /// its maximum total duration, pushes the expiry out to
    /// `min(now + timeout, created_at + max_duration)`. The renewal count
    /// only moves when the expiry actually does, so stamping twice at the
    /// same instant cannot double-count a renewal. Any pending expiry
    /// warning is cleared by activity.
    ///
    /// Fails with [`UproarError::Capacity`] when the table is full and the
    /// conversation has no session yet.
    pub async fn touch(
        &self,
        conversation_id: &str,
        channel: &str,
    ) -> Result<TouchOutcome, UproarError> {
        self.touch_at(conversation_id, channel, Utc::now()).await
    }

    pub async fn touch_at(
        &self,
        conversation_id: &str,
        channel: &str,
        now: DateTime<Utc>,
    ) -> Result<TouchOutcome, UproarError> {
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.get_mut(conversation_id) {
            session.last_activity_at = now;
            session.message_count += 1;
            session.warning_sent = false;

            let mut renewed = false;
            if self.config.auto_renew {
                let max_duration = Duration::minutes(self.config.max_duration_minutes as i64);
                if now - session.created_at < max_duration {
                    let new_expiry = std::cmp::min(
                        now + Duration::minutes(self.config.timeout_minutes as i64),
                        session.created_at + max_duration,
                    );
                    if new_expiry > session.expires_at {
                        session.expires_at = new_expiry;
                        session.renewal_count += 1;
                        renewed = true;
                    }
                }
            }

            debug!(
                session_id = %session.id,
                conversation_id,
                renewed,
                "session activity stamped"
            );
            return Ok(TouchOutcome::Touched {
                session_id: session.id.clone(),
                renewed,
            });
        }

        if sessions.len() >= self.config.max_sessions {
            return Err(UproarError::Capacity {
                resource: "sessions".to_string(),
                limit: self.config.max_sessions,
            });
        }

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            channel: channel.to_string(),
            created_at: now,
            last_activity_at: now,
            expires_at: now + Duration::minutes(self.config.timeout_minutes as i64),
            renewal_count: 0,
            message_count: 1,
            warning_sent: false,
            metadata: HashMap::new(),
        };
        let session_id = session.id.clone();
        info!(session_id = %session_id, conversation_id, channel, "session created");
        sessions.insert(conversation_id.to_string(), session);
        uproar_telemetry::record_session_opened();
        uproar_telemetry::set_active_sessions(sessions.len() as f64);

        Ok(TouchOutcome::Created { session_id })
    }

    /// Remove expired sessions and flag sessions close to expiry.
    ///
    /// Safe to re-run at any time: everything is derived from timestamps,
    /// so an interrupted pass simply finishes on the next tick. Returns
    /// the events of this pass for the notification path.
    pub async fn sweep(&self) -> Vec<SessionEvent> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        let warning_threshold = Duration::minutes(self.config.warning_threshold_minutes as i64);
        let mut events = Vec::new();
        let mut sessions = self.sessions.lock().await;

        sessions.retain(|conversation_id, session| {
            if session.expires_at <= now {
                debug!(
                    session_id = %session.id,
                    conversation_id,
                    "session expired"
                );
                events.push(SessionEvent::Expired(SessionSummary::from_session(session)));
                return false;
            }
            if !session.warning_sent && session.expires_at - now <= warning_threshold {
                session.warning_sent = true;
                events.push(SessionEvent::ExpiringSoon(SessionSummary::from_session(
                    session,
                )));
            }
            true
        });

        let expired = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Expired(_)))
            .count();
        if expired > 0 {
            info!(expired, remaining = sessions.len(), "session sweep");
            for _ in 0..expired {
                uproar_telemetry::record_session_closed("expired");
            }
            uproar_telemetry::set_active_sessions(sessions.len() as f64);
        }

        events
    }

    /// Remove a session explicitly, returning its final summary.
    pub async fn terminate(&self, conversation_id: &str) -> Option<SessionSummary> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.remove(conversation_id)?;
        info!(session_id = %session.id, conversation_id, "session terminated");
        uproar_telemetry::record_session_closed("terminated");
        uproar_telemetry::set_active_sessions(sessions.len() as f64);
        Some(SessionSummary::from_session(&session))
    }

    /// Current summary for a conversation, if one is tracked.
    pub async fn snapshot(&self, conversation_id: &str) -> Option<SessionSummary> {
        let sessions = self.sessions.lock().await;
        sessions.get(conversation_id).map(SessionSummary::from_session)
    }

    /// Attach a metadata entry to a conversation's session.
    pub async fn set_metadata(&self, conversation_id: &str, key: &str, value: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(conversation_id) {
            Some(session) => {
                session.metadata.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Read a metadata entry from a conversation's session.
    pub async fn metadata(&self, conversation_id: &str, key: &str) -> Option<String> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(conversation_id)
            .and_then(|s| s.metadata.get(key).cloned())
    }

    /// Number of currently tracked sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
