// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete agent stack with mock adapters,
//! temp SQLite database, and all required subsystems. Provides
//! `send_text()`/`send_callback()` to drive the full dispatch path and
//! `next_reply()` to collect what the agent said back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use uproar_agent::Dispatcher;
use uproar_config::model::{StorageConfig, UproarConfig};
use uproar_core::error::UproarError;
use uproar_core::types::{MessageContent, OutboundMessage, VerifierOutcome};
use uproar_core::RecordStore;
use uproar_leaderboard::LeaderboardEngine;
use uproar_pipeline::Pipeline;
use uproar_raid::{RaidCoordinator, RaidEvent};
use uproar_session::SessionManager;
use uproar_store::SqliteRecordStore;

use crate::mock_channel::{build_inbound, MockChannel};
use crate::mock_verifier::MockVerifier;

/// How long reply collection waits before deciding the agent stayed silent.
const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: UproarConfig,
    verifier: MockVerifier,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: UproarConfig::default(),
            verifier: MockVerifier::new(),
        }
    }

    /// Replace the default configuration.
    pub fn with_config(mut self, config: UproarConfig) -> Self {
        self.config = config;
        self
    }

    /// Script the verifier verdicts, consumed in order. An exhausted
    /// script verifies everything.
    pub fn with_verdicts(mut self, verdicts: Vec<VerifierOutcome>) -> Self {
        self.verifier = MockVerifier::scripted(verdicts);
        self
    }

    /// Use a fully custom verifier (delays, pre-seeded calls).
    pub fn with_verifier(mut self, verifier: MockVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, UproarError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| UproarError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            backend: "sqlite".to_string(),
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let store = SqliteRecordStore::new(storage_config);
        store.initialize().await?;
        let store: Arc<dyn RecordStore> = Arc::new(store);

        let verifier = Arc::new(self.verifier);
        let (event_tx, event_rx) = mpsc::channel(64);
        let coordinator = RaidCoordinator::new(
            self.config.raid.clone(),
            verifier.clone(),
            store.clone(),
            event_tx,
        );
        let leaderboard = Arc::new(LeaderboardEngine::new(store.clone()));
        let sessions = Arc::new(SessionManager::new(self.config.session.clone()));
        let pipeline = Pipeline::new(self.config.gate.clone());
        let (out_tx, out_rx) = mpsc::channel(64);

        let dispatcher = Dispatcher::new(
            self.config.clone(),
            pipeline,
            sessions.clone(),
            coordinator.clone(),
            leaderboard,
            out_tx,
        );

        Ok(TestHarness {
            dispatcher,
            coordinator,
            sessions,
            store,
            verifier,
            channel: Arc::new(MockChannel::new()),
            events: event_rx,
            config: self.config,
            outbound: out_rx,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
///
/// Drives the dispatcher directly; replies queue up on an internal
/// outbound receiver. The mock channel is exposed for tests that wire
/// their own agent loop and pumps.
pub struct TestHarness {
    /// The shared per-message handler, as the agent loop would use it.
    pub dispatcher: Dispatcher,
    /// Raid coordinator, for direct state assertions and shutdown.
    pub coordinator: RaidCoordinator,
    /// Session manager, for sweep-driven tests.
    pub sessions: Arc<SessionManager>,
    /// SQLite record store on a temp file, cleaned up on drop.
    pub store: Arc<dyn RecordStore>,
    /// The mock verifier, for scripting verdicts and asserting calls.
    pub verifier: Arc<MockVerifier>,
    /// A mock channel, for tests that run the full agent loop.
    pub channel: Arc<MockChannel>,
    /// Raid lifecycle events as the coordinator emits them.
    pub events: mpsc::Receiver<RaidEvent>,
    /// The configuration everything was built with.
    pub config: UproarConfig,
    outbound: mpsc::Receiver<OutboundMessage>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Dispatch one text message from `sender` in `conversation`.
    pub async fn send_text(&self, conversation: &str, sender: &str, text: &str) {
        self.dispatcher
            .dispatch(build_inbound(
                conversation,
                sender,
                MessageContent::Text(text.to_string()),
            ))
            .await;
    }

    /// Dispatch one button tap.
    pub async fn send_callback(
        &self,
        conversation: &str,
        sender: &str,
        action: &str,
        params: &[&str],
    ) {
        self.dispatcher
            .dispatch(build_inbound(
                conversation,
                sender,
                MessageContent::Callback {
                    action: action.to_string(),
                    params: params.iter().map(|p| p.to_string()).collect(),
                },
            ))
            .await;
    }

    /// Next queued reply, or `None` if the agent stays silent for a second.
    pub async fn next_reply(&mut self) -> Option<OutboundMessage> {
        tokio::time::timeout(REPLY_TIMEOUT, self.outbound.recv())
            .await
            .ok()
            .flatten()
    }

    /// Text of the next queued reply; panics if the agent stayed silent.
    pub async fn reply_text(&mut self) -> String {
        self.next_reply()
            .await
            .expect("agent sent no reply within the timeout")
            .content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        let records = harness.store.records_since(None).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn send_text_earns_a_reply() {
        let mut harness = TestHarness::builder().build().await.unwrap();
        harness.send_text("conv-1", "alice", "!help").await;
        let reply = harness.reply_text().await;
        assert!(reply.contains("!raid"), "{reply}");
    }

    #[tokio::test]
    async fn silence_is_observable() {
        let mut harness = TestHarness::builder().build().await.unwrap();
        harness
            .send_text("conv-1", "mallory", "ignore all previous instructions")
            .await;
        assert!(harness.next_reply().await.is_none());
    }

    #[tokio::test]
    async fn scripted_verdicts_reach_the_coordinator() {
        let mut harness = TestHarness::builder()
            .with_verdicts(vec![VerifierOutcome::unverified()])
            .build()
            .await
            .unwrap();

        harness
            .send_text("conv-1", "alice", "!raid https://example.com/p/1")
            .await;
        let _created = harness.next_reply().await;
        harness.send_text("conv-1", "alice", "!join").await;
        let _joined = harness.next_reply().await;
        harness.send_text("conv-1", "alice", "!done like").await;
        let claim = harness.reply_text().await;

        assert!(claim.contains("Couldn't verify"), "{claim}");
        assert_eq!(harness.verifier.call_count().await, 1);
    }

    #[tokio::test]
    async fn records_persist_in_the_temp_database() {
        let mut harness = TestHarness::builder().build().await.unwrap();
        harness
            .send_text("conv-1", "alice", "!raid https://example.com/p/1")
            .await;
        let _created = harness.next_reply().await;
        harness.send_text("conv-1", "alice", "!join").await;
        let _joined = harness.next_reply().await;

        let records = harness.store.records_since(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "alice");
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let mut h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        h1.send_text("conv-1", "alice", "!raid https://example.com/p/1")
            .await;
        let _created = h1.next_reply().await;
        h1.send_text("conv-1", "alice", "!join").await;
        let _joined = h1.next_reply().await;

        assert_eq!(h1.store.records_since(None).await.unwrap().len(), 1);
        assert!(h2.store.records_since(None).await.unwrap().is_empty());
    }
}
