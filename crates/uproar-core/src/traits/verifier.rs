// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engagement verifier trait for pluggable action checks.

use async_trait::async_trait;

use crate::error::UproarError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ActionKind, VerifierOutcome};

/// Pluggable check that a participant's claimed external action actually
/// occurred on the target platform.
///
/// Verification is best-effort: an implementation may call a platform API,
/// scrape public data, or trust every claim. Callers bound every `verify`
/// call with an explicit timeout and treat a timeout as unverified; an
/// implementation must never be relied on to return promptly.
#[async_trait]
pub trait EngagementVerifier: PluginAdapter {
    /// Checks whether `user_id` performed `action` against `target`.
    ///
    /// Returns `Ok` with an unverified outcome when the claim could not be
    /// confirmed; `Err` is reserved for infrastructure failures (backend
    /// unreachable, malformed response).
    async fn verify(
        &self,
        target: &str,
        user_id: &str,
        action: ActionKind,
    ) -> Result<VerifierOutcome, UproarError>;
}
