// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Uproar engagement engine.

use thiserror::Error;

/// The primary error type used across all Uproar adapter traits and core operations.
///
/// Predictable domain refusals (a full raid, a rate-limited sender, an expired
/// session) are NOT errors; they are modelled as outcome enums returned in `Ok`.
/// This enum covers configuration, infrastructure, and plumbing failures only.
#[derive(Debug, Error)]
pub enum UproarError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, delivery failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Engagement verifier errors (backend unreachable, malformed response).
    #[error("verifier error: {message}")]
    Verifier {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A bounded resource (session table, campaign roster) is at its configured limit.
    #[error("{resource} is at capacity ({limit})")]
    Capacity { resource: String, limit: usize },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
