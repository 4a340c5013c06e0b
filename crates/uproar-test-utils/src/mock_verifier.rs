// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock engagement verifier for deterministic testing.
//!
//! `MockVerifier` implements `EngagementVerifier` with scripted verdicts,
//! enabling tests of the verified/unverified paths without a platform API.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use uproar_core::error::UproarError;
use uproar_core::traits::{EngagementVerifier, PluginAdapter};
use uproar_core::types::{ActionKind, AdapterType, HealthStatus, VerifierOutcome};

/// One captured `verify()` call for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyCall {
    pub target: String,
    pub user_id: String,
    pub action: ActionKind,
}

/// A mock verifier that pops verdicts from a FIFO queue.
///
/// When the queue is empty every claim verifies. An optional artificial
/// delay simulates a slow verification backend.
pub struct MockVerifier {
    verdicts: Mutex<VecDeque<VerifierOutcome>>,
    calls: Mutex<Vec<VerifyCall>>,
    delay: Option<Duration>,
}

impl MockVerifier {
    /// A verifier that approves everything.
    pub fn new() -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// A verifier pre-loaded with verdicts, consumed in order.
    pub fn scripted(verdicts: Vec<VerifierOutcome>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep for `delay` inside every `verify()` call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a verdict to the queue.
    pub async fn push_verdict(&self, outcome: VerifierOutcome) {
        self.verdicts.lock().await.push_back(outcome);
    }

    /// Every `verify()` call seen so far, in order.
    pub async fn calls(&self) -> Vec<VerifyCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockVerifier {
    fn name(&self) -> &str {
        "mock-verifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Verifier
    }

    async fn health_check(&self) -> Result<HealthStatus, UproarError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), UproarError> {
        Ok(())
    }
}

#[async_trait]
impl EngagementVerifier for MockVerifier {
    async fn verify(
        &self,
        target: &str,
        user_id: &str,
        action: ActionKind,
    ) -> Result<VerifierOutcome, UproarError> {
        self.calls.lock().await.push(VerifyCall {
            target: target.to_string(),
            user_id: user_id.to_string(),
            action,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self
            .verdicts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(VerifierOutcome::verified))
    }
}
