// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as window ordering, non-empty paths, and known backend names.

use crate::diagnostic::ConfigError;
use crate::model::UproarConfig;

/// Log levels accepted by `agent.log_level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Record store backends accepted by `storage.backend`.
const VALID_BACKENDS: &[&str] = &["sqlite", "memory"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &UproarConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate log level is a known name
    let level = config.agent.log_level.to_lowercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` is not one of: {}",
                config.agent.log_level,
                VALID_LOG_LEVELS.join(", ")
            ),
        });
    }

    // Validate gate limits are usable
    if config.gate.rate_limit_max_requests == 0 {
        errors.push(ConfigError::Validation {
            message: "gate.rate_limit_max_requests must be at least 1".to_string(),
        });
    }

    if config.gate.rate_limit_window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "gate.rate_limit_window_secs must be at least 1".to_string(),
        });
    }

    if config.gate.max_message_len == 0 {
        errors.push(ConfigError::Validation {
            message: "gate.max_message_len must be at least 1".to_string(),
        });
    }

    if config.gate.repeat_threshold < 2 {
        errors.push(ConfigError::Validation {
            message: format!(
                "gate.repeat_threshold must be at least 2 (a single message cannot repeat), got {}",
                config.gate.repeat_threshold
            ),
        });
    }

    // Validate session lifecycle ordering
    if config.session.timeout_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "session.timeout_minutes must be at least 1".to_string(),
        });
    }

    if config.session.warning_threshold_minutes >= config.session.timeout_minutes
        && config.session.timeout_minutes > 0
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.warning_threshold_minutes ({}) must be less than session.timeout_minutes ({})",
                config.session.warning_threshold_minutes, config.session.timeout_minutes
            ),
        });
    }

    if config.session.max_duration_minutes < config.session.timeout_minutes {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.max_duration_minutes ({}) must be at least session.timeout_minutes ({})",
                config.session.max_duration_minutes, config.session.timeout_minutes
            ),
        });
    }

    if config.session.max_sessions == 0 {
        errors.push(ConfigError::Validation {
            message: "session.max_sessions must be at least 1".to_string(),
        });
    }

    if config.session.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.sweep_interval_secs must be at least 1".to_string(),
        });
    }

    // Validate raid duration bounds
    if config.raid.min_duration_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "raid.min_duration_minutes must be at least 1".to_string(),
        });
    }

    if config.raid.max_duration_minutes < config.raid.min_duration_minutes {
        errors.push(ConfigError::Validation {
            message: format!(
                "raid.max_duration_minutes ({}) must be at least raid.min_duration_minutes ({})",
                config.raid.max_duration_minutes, config.raid.min_duration_minutes
            ),
        });
    }

    if config.raid.default_duration_minutes < config.raid.min_duration_minutes
        || config.raid.default_duration_minutes > config.raid.max_duration_minutes
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "raid.default_duration_minutes ({}) must lie between raid.min_duration_minutes ({}) and raid.max_duration_minutes ({})",
                config.raid.default_duration_minutes,
                config.raid.min_duration_minutes,
                config.raid.max_duration_minutes
            ),
        });
    }

    if config.raid.max_participants == 0 {
        errors.push(ConfigError::Validation {
            message: "raid.max_participants must be at least 1".to_string(),
        });
    }

    if config.raid.verifier_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "raid.verifier_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.raid.broadcast_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "raid.broadcast_interval_secs must be at least 1".to_string(),
        });
    }

    // Validate scoring cap leaves headroom for at least one scored action
    let max_base = [
        config.scoring.weight_repost,
        config.scoring.weight_quote,
        config.scoring.weight_reply,
        config.scoring.weight_share,
        config.scoring.weight_like,
        config.scoring.weight_view,
    ]
    .into_iter()
    .max()
    .unwrap_or(0);

    if config.scoring.max_points_per_participant < max_base {
        errors.push(ConfigError::Validation {
            message: format!(
                "scoring.max_points_per_participant ({}) is below the largest action weight ({})",
                config.scoring.max_points_per_participant, max_base
            ),
        });
    }

    // Validate storage backend is known
    if !VALID_BACKENDS.contains(&config.storage.backend.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "storage.backend `{}` is not one of: {}",
                config.storage.backend,
                VALID_BACKENDS.join(", ")
            ),
        });
    }

    // Validate database_path is not empty when the sqlite backend is selected
    if config.storage.backend == "sqlite" && config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
