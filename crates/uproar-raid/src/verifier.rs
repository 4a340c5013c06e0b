// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in trust verifier.

use async_trait::async_trait;
use tracing::debug;

use uproar_core::types::{ActionKind, VerifierOutcome};
use uproar_core::{AdapterType, EngagementVerifier, HealthStatus, PluginAdapter, UproarError};

/// Verifier that accepts every claim without checking.
///
/// The default policy when no platform integration is configured. Never
/// reports a weight override, so configured base weights always apply.
pub struct TrustVerifier;

#[async_trait]
impl PluginAdapter for TrustVerifier {
    fn name(&self) -> &str {
        "trust"
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
impl EngagementVerifier for TrustVerifier {
    async fn verify(
        &self,
        target: &str,
        user_id: &str,
        action: ActionKind,
    ) -> Result<VerifierOutcome, UproarError> {
        debug!(url = target, user_id, action = %action, "trust policy: claim accepted");
        Ok(VerifierOutcome::verified())
    }
}
