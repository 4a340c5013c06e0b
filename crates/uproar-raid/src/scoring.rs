// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Point arithmetic for raid participation.
//!
//! Pure functions over the scoring configuration; the coordinator decides
//! when they apply. The per-participant cap bounds the campaign total, so
//! a breakdown can report a full award while granting less.

use chrono::{DateTime, Utc};

use uproar_config::model::ScoringConfig;
use uproar_core::types::ActionKind;

/// The award computed for one verified action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Verifier weight override, or the configured weight for the kind.
    pub base: u32,
    pub speed_bonus: u32,
    pub verification_bonus: u32,
    /// Points actually granted once the participant cap is applied.
    pub granted: u32,
    pub capped: bool,
}

/// Early-joiner bonus for the participant at `join_index` (0-based), or 0.
pub fn early_joiner_bonus(scoring: &ScoringConfig, join_index: usize) -> u32 {
    if join_index < scoring.early_joiner_cutoff {
        scoring.early_joiner_bonus
    } else {
        0
    }
}

/// Compute the award for one verifier-confirmed action.
///
/// The speed bonus rewards a participant's first verified completion when
/// the claim lands within the configured window of their join; callers pass
/// `speed_eligible = false` once the participant has verified anything.
/// `points_before` is the participant's current campaign total; the grant
/// never pushes it past the cap.
pub fn award_for_verified_action(
    scoring: &ScoringConfig,
    kind: ActionKind,
    weight_override: Option<u32>,
    joined_at: DateTime<Utc>,
    claimed_at: DateTime<Utc>,
    speed_eligible: bool,
    points_before: u32,
) -> ScoreBreakdown {
    let elapsed_secs = claimed_at.signed_duration_since(joined_at).num_seconds();
    let in_window = (0..=scoring.speed_window_secs as i64).contains(&elapsed_secs);

    let base = weight_override.unwrap_or_else(|| scoring.weight_for(kind));
    let speed_bonus = if speed_eligible && in_window {
        scoring.speed_bonus
    } else {
        0
    };

    let raw = base + speed_bonus + scoring.verification_bonus;
    let headroom = scoring.max_points_per_participant.saturating_sub(points_before);
    let granted = raw.min(headroom);

    ScoreBreakdown {
        base,
        speed_bonus,
        verification_bonus: scoring.verification_bonus,
        granted,
        capped: granted < raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn early_bonus_applies_below_the_cutoff_only() {
        let scoring = ScoringConfig::default();
        assert_eq!(early_joiner_bonus(&scoring, 0), 2);
        assert_eq!(early_joiner_bonus(&scoring, 9), 2);
        assert_eq!(early_joiner_bonus(&scoring, 10), 0);
    }

    #[test]
    fn fast_verified_repost_earns_weight_speed_and_verification() {
        let scoring = ScoringConfig::default();
        let joined = t("2026-03-01T10:00:00Z");
        let claimed = t("2026-03-01T10:02:00Z");

        let award = award_for_verified_action(
            &scoring,
            ActionKind::Repost,
            Some(3),
            joined,
            claimed,
            true,
            2,
        );
        assert_eq!(award.base, 3);
        assert_eq!(award.speed_bonus, 3);
        assert_eq!(award.verification_bonus, 1);
        assert_eq!(award.granted, 7);
        assert!(!award.capped);
    }

    #[test]
    fn slow_claim_misses_the_speed_bonus() {
        let scoring = ScoringConfig::default();
        let joined = t("2026-03-01T10:00:00Z");
        let exactly_window = t("2026-03-01T10:05:00Z");
        let past_window = t("2026-03-01T10:05:01Z");

        let on_time = award_for_verified_action(
            &scoring,
            ActionKind::Like,
            None,
            joined,
            exactly_window,
            true,
            0,
        );
        assert_eq!(on_time.speed_bonus, 3);

        let late = award_for_verified_action(
            &scoring,
            ActionKind::Like,
            None,
            joined,
            past_window,
            true,
            0,
        );
        assert_eq!(late.speed_bonus, 0);
        assert_eq!(late.granted, 2); // weight 1 + verification 1
    }

    #[test]
    fn repeat_verifications_skip_the_speed_bonus() {
        let scoring = ScoringConfig::default();
        let joined = t("2026-03-01T10:00:00Z");
        let claimed = t("2026-03-01T10:01:00Z");

        let award = award_for_verified_action(
            &scoring,
            ActionKind::Quote,
            None,
            joined,
            claimed,
            false,
            9,
        );
        assert_eq!(award.speed_bonus, 0);
        assert_eq!(award.granted, 4); // weight 3 + verification 1
    }

    #[test]
    fn verifier_override_replaces_the_base_weight_only() {
        let scoring = ScoringConfig::default();
        let joined = t("2026-03-01T10:00:00Z");
        let claimed = t("2026-03-01T10:20:00Z");

        let award = award_for_verified_action(
            &scoring,
            ActionKind::View,
            Some(5),
            joined,
            claimed,
            true,
            0,
        );
        assert_eq!(award.base, 5);
        assert_eq!(award.granted, 6); // override 5 + verification 1, no speed
    }

    #[test]
    fn cap_truncates_the_grant() {
        let mut scoring = ScoringConfig::default();
        scoring.max_points_per_participant = 10;
        let joined = t("2026-03-01T10:00:00Z");
        let claimed = t("2026-03-01T10:01:00Z");

        let award = award_for_verified_action(
            &scoring,
            ActionKind::Repost,
            None,
            joined,
            claimed,
            true,
            8,
        );
        assert_eq!(award.granted, 2);
        assert!(award.capped);

        let at_cap = award_for_verified_action(
            &scoring,
            ActionKind::Repost,
            None,
            joined,
            claimed,
            true,
            10,
        );
        assert_eq!(at_cap.granted, 0);
        assert!(at_cap.capped);
    }

    #[test]
    fn claim_timestamp_before_join_never_earns_speed() {
        let scoring = ScoringConfig::default();
        let joined = t("2026-03-01T10:00:00Z");
        let skewed = t("2026-03-01T09:59:00Z");

        let award =
            award_for_verified_action(&scoring, ActionKind::Reply, None, joined, skewed, true, 0);
        assert_eq!(award.speed_bonus, 0);
    }
}
