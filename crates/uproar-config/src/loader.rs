// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./uproar.toml` > `~/.config/uproar/uproar.toml` > `/etc/uproar/uproar.toml`
//! with environment variable overrides via `UPROAR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::UproarConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/uproar/uproar.toml` (system-wide)
/// 3. `~/.config/uproar/uproar.toml` (user XDG config)
/// 4. `./uproar.toml` (local directory)
/// 5. `UPROAR_*` environment variables
pub fn load_config() -> Result<UproarConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UproarConfig::default()))
        .merge(Toml::file("/etc/uproar/uproar.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("uproar/uproar.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("uproar.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used by tests and callers that carry their own config text.
pub fn load_config_from_str(toml_content: &str) -> Result<UproarConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UproarConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<UproarConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UproarConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `UPROAR_GATE_MAX_MESSAGE_LEN` must
/// map to `gate.max_message_len`, not `gate.max.message.len`.
fn env_provider() -> Env {
    Env::prefixed("UPROAR_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: UPROAR_SESSION_TIMEOUT_MINUTES -> "session_timeout_minutes"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("gate_", "gate.", 1)
            .replacen("session_", "session.", 1)
            .replacen("raid_", "raid.", 1)
            .replacen("scoring_", "scoring.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("console_", "console.", 1);
        mapped.into()
    })
}
