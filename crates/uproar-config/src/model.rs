// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Uproar engagement agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use uproar_core::ActionKind;

/// Top-level Uproar configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UproarConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Inbound gate settings (rate limits, spam screens).
    #[serde(default)]
    pub gate: GateConfig,

    /// Conversation session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Raid campaign settings.
    #[serde(default)]
    pub raid: RaidConfig,

    /// Engagement scoring weights and bonuses.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Console channel settings.
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "uproar".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Inbound gate configuration.
///
/// The gate screens every inbound message before session or raid logic runs.
/// Refusals produced under these limits are normal outcomes, not errors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Maximum admitted messages per sender within the rate window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Sliding rate window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Maximum accepted message length in characters.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Messages within the burst window before a sender is flagged as flooding.
    #[serde(default = "default_spam_burst_max")]
    pub spam_burst_max: u32,

    /// Burst window length in seconds for the flood screen.
    #[serde(default = "default_spam_burst_window_secs")]
    pub spam_burst_window_secs: u64,

    /// Identical consecutive messages before a sender is flagged as repeating.
    #[serde(default = "default_repeat_threshold")]
    pub repeat_threshold: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            max_message_len: default_max_message_len(),
            spam_burst_max: default_spam_burst_max(),
            spam_burst_window_secs: default_spam_burst_window_secs(),
            repeat_threshold: default_repeat_threshold(),
        }
    }
}

fn default_rate_limit_max_requests() -> u32 {
    10
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_max_message_len() -> usize {
    4096
}

fn default_spam_burst_max() -> u32 {
    5
}

fn default_spam_burst_window_secs() -> u64 {
    10
}

fn default_repeat_threshold() -> u32 {
    3
}

/// Conversation session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Idle minutes before a session expires.
    #[serde(default = "default_session_timeout_minutes")]
    pub timeout_minutes: u64,

    /// Whether activity on a session resets its idle clock.
    #[serde(default = "default_auto_renew")]
    pub auto_renew: bool,

    /// Hard cap on total session lifetime in minutes, regardless of activity.
    #[serde(default = "default_max_duration_minutes")]
    pub max_duration_minutes: u64,

    /// Minutes of remaining idle time below which a session is flagged as expiring soon.
    #[serde(default = "default_warning_threshold_minutes")]
    pub warning_threshold_minutes: u64,

    /// Maximum number of concurrently tracked sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds between background sweeps of expired sessions.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_session_timeout_minutes(),
            auto_renew: default_auto_renew(),
            max_duration_minutes: default_max_duration_minutes(),
            warning_threshold_minutes: default_warning_threshold_minutes(),
            max_sessions: default_max_sessions(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_session_timeout_minutes() -> u64 {
    30
}

fn default_auto_renew() -> bool {
    true
}

fn default_max_duration_minutes() -> u64 {
    240
}

fn default_warning_threshold_minutes() -> u64 {
    5
}

fn default_max_sessions() -> usize {
    1000
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Raid campaign configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RaidConfig {
    /// Maximum participants per raid.
    #[serde(default = "default_max_participants")]
    pub max_participants: usize,

    /// Shortest allowed raid duration in minutes.
    #[serde(default = "default_min_duration_minutes")]
    pub min_duration_minutes: u64,

    /// Longest allowed raid duration in minutes.
    #[serde(default = "default_raid_max_duration_minutes")]
    pub max_duration_minutes: u64,

    /// Duration applied when a raid is created without one.
    #[serde(default = "default_raid_duration_minutes")]
    pub default_duration_minutes: u64,

    /// Seconds between progress broadcasts for an active raid.
    #[serde(default = "default_broadcast_interval_secs")]
    pub broadcast_interval_secs: u64,

    /// Seconds to wait on the external verifier before treating an action as unverified.
    #[serde(default = "default_verifier_timeout_secs")]
    pub verifier_timeout_secs: u64,
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            max_participants: default_max_participants(),
            min_duration_minutes: default_min_duration_minutes(),
            max_duration_minutes: default_raid_max_duration_minutes(),
            default_duration_minutes: default_raid_duration_minutes(),
            broadcast_interval_secs: default_broadcast_interval_secs(),
            verifier_timeout_secs: default_verifier_timeout_secs(),
        }
    }
}

fn default_max_participants() -> usize {
    500
}

fn default_min_duration_minutes() -> u64 {
    5
}

fn default_raid_duration_minutes() -> u64 {
    30
}

fn default_raid_max_duration_minutes() -> u64 {
    1440
}

fn default_broadcast_interval_secs() -> u64 {
    600
}

fn default_verifier_timeout_secs() -> u64 {
    5
}

/// Engagement scoring weights and bonuses.
///
/// Base weights apply per verified action kind; bonuses stack on top.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Points for a verified repost.
    #[serde(default = "default_weight_repost")]
    pub weight_repost: u32,

    /// Points for a verified quote post.
    #[serde(default = "default_weight_quote")]
    pub weight_quote: u32,

    /// Points for a verified reply.
    #[serde(default = "default_weight_reply")]
    pub weight_reply: u32,

    /// Points for a verified share.
    #[serde(default = "default_weight_share")]
    pub weight_share: u32,

    /// Points for a verified like.
    #[serde(default = "default_weight_like")]
    pub weight_like: u32,

    /// Points for a verified view.
    #[serde(default = "default_weight_view")]
    pub weight_view: u32,

    /// Join position at or below which the early joiner bonus applies.
    #[serde(default = "default_early_joiner_cutoff")]
    pub early_joiner_cutoff: usize,

    /// Bonus points for joining within the early cutoff.
    #[serde(default = "default_early_joiner_bonus")]
    pub early_joiner_bonus: u32,

    /// Bonus points for a first verified completion within the speed window.
    #[serde(default = "default_speed_bonus")]
    pub speed_bonus: u32,

    /// Seconds after joining within which the speed bonus applies.
    #[serde(default = "default_speed_window_secs")]
    pub speed_window_secs: u64,

    /// Bonus points for each verifier-confirmed action.
    #[serde(default = "default_verification_bonus")]
    pub verification_bonus: u32,

    /// Hard cap on total points a participant can earn in one raid.
    #[serde(default = "default_max_points_per_participant")]
    pub max_points_per_participant: u32,
}

impl ScoringConfig {
    /// Base point weight for a verified action of the given kind.
    pub fn weight_for(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Repost => self.weight_repost,
            ActionKind::Quote => self.weight_quote,
            ActionKind::Reply => self.weight_reply,
            ActionKind::Share => self.weight_share,
            ActionKind::Like => self.weight_like,
            ActionKind::View => self.weight_view,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_repost: default_weight_repost(),
            weight_quote: default_weight_quote(),
            weight_reply: default_weight_reply(),
            weight_share: default_weight_share(),
            weight_like: default_weight_like(),
            weight_view: default_weight_view(),
            early_joiner_cutoff: default_early_joiner_cutoff(),
            early_joiner_bonus: default_early_joiner_bonus(),
            speed_bonus: default_speed_bonus(),
            speed_window_secs: default_speed_window_secs(),
            verification_bonus: default_verification_bonus(),
            max_points_per_participant: default_max_points_per_participant(),
        }
    }
}

fn default_weight_repost() -> u32 {
    3
}

fn default_weight_quote() -> u32 {
    3
}

fn default_weight_reply() -> u32 {
    2
}

fn default_weight_share() -> u32 {
    1
}

fn default_weight_like() -> u32 {
    1
}

fn default_weight_view() -> u32 {
    1
}

fn default_early_joiner_cutoff() -> usize {
    10
}

fn default_early_joiner_bonus() -> u32 {
    2
}

fn default_speed_bonus() -> u32 {
    3
}

fn default_speed_window_secs() -> u64 {
    300
}

fn default_verification_bonus() -> u32 {
    1
}

fn default_max_points_per_participant() -> u32 {
    200
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Record store backend: `sqlite` or `memory`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to enable WAL journaling mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_storage_backend() -> String {
    "sqlite".to_string()
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("uproar/uproar.db").display().to_string())
        .unwrap_or_else(|| "uproar.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Console channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Whether the interactive console channel is enabled.
    #[serde(default = "default_console_enabled")]
    pub enabled: bool,

    /// Conversation id assigned to console input.
    #[serde(default = "default_console_conversation_id")]
    pub conversation_id: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_console_enabled(),
            conversation_id: default_console_conversation_id(),
        }
    }
}

fn default_console_enabled() -> bool {
    true
}

fn default_console_conversation_id() -> String {
    "console".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_gate_limits() {
        let config = UproarConfig::default();
        assert_eq!(config.gate.rate_limit_max_requests, 10);
        assert_eq!(config.gate.rate_limit_window_secs, 60);
        assert_eq!(config.gate.repeat_threshold, 3);
    }

    #[test]
    fn default_config_has_expected_session_lifecycle() {
        let config = UproarConfig::default();
        assert_eq!(config.session.timeout_minutes, 30);
        assert_eq!(config.session.max_sessions, 1000);
        assert_eq!(config.session.sweep_interval_secs, 300);
        assert!(config.session.auto_renew);
    }

    #[test]
    fn scoring_weight_lookup_matches_fields() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.weight_for(ActionKind::Repost), 3);
        assert_eq!(scoring.weight_for(ActionKind::Quote), 3);
        assert_eq!(scoring.weight_for(ActionKind::Reply), 2);
        assert_eq!(scoring.weight_for(ActionKind::Like), 1);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = UproarConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: UproarConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.agent.name, config.agent.name);
        assert_eq!(parsed.raid.verifier_timeout_secs, 5);
        assert_eq!(
            parsed.scoring.max_points_per_participant,
            config.scoring.max_points_per_participant
        );
    }
}
