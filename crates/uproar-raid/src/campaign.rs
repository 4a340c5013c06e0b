// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raid campaign domain state.
//!
//! A campaign is a time-boxed group activity against one target URL.
//! Participants join, claim external actions, and accumulate points as the
//! verifier confirms them. All state here is plain data; the coordinator
//! owns the locking and the timers.

use chrono::{DateTime, SecondsFormat, Utc};
use strum::{Display, EnumString};

use uproar_config::model::ScoringConfig;
use uproar_core::types::{ActionKind, EngagementRecord};

/// Campaign lifecycle status.
///
/// `create` persists a campaign already active; the only transitions out
/// are the terminal pair, and terminal campaigns never mutate again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum RaidStatus {
    Active,
    Completed,
    Cancelled,
}

impl RaidStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RaidStatus::Active)
    }
}

/// One claimed action by a participant, with its verification verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedAction {
    pub kind: ActionKind,
    pub claimed_at: DateTime<Utc>,
    pub verified: bool,
    /// Points granted for this claim (0 when unverified or capped away).
    pub points_awarded: u32,
}

/// A user's membership and progress within one campaign.
#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    /// 0-based position in join order.
    pub join_index: usize,
    /// Stable row id for the persisted engagement record.
    pub record_id: String,
    /// Every claim in arrival order, verified or not.
    pub actions: Vec<ClaimedAction>,
    pub points: u32,
    pub verified_actions: u32,
    pub first_verified_at: Option<DateTime<Utc>>,
    pub early_bonus: bool,
}

impl Participant {
    /// Whether a verified claim of `kind` has already been credited.
    pub fn has_verified(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind == kind && a.verified)
    }
}

/// One raid campaign and everything it owns.
#[derive(Debug, Clone)]
pub struct RaidCampaign {
    pub id: String,
    /// Conversation the raid was created in; broadcasts go back here.
    pub conversation_id: String,
    pub target: String,
    pub status: RaidStatus,
    pub scoring: ScoringConfig,
    pub max_participants: usize,
    pub created_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
    /// Verifier-confirmed actions across all participants.
    pub total_verified_actions: u32,
    /// Every completion claim, including unverified ones.
    pub total_attempts: u32,
}

impl RaidCampaign {
    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn participant_mut(&mut self, user_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    /// Point-in-time view for status replies and periodic broadcasts.
    pub fn progress_at(&self, now: DateTime<Utc>) -> RaidProgress {
        let remaining = self.ends_at.signed_duration_since(now).num_minutes().max(0);
        RaidProgress {
            campaign_id: self.id.clone(),
            conversation_id: self.conversation_id.clone(),
            target: self.target.clone(),
            status: self.status,
            participant_count: self.participants.len(),
            total_verified_actions: self.total_verified_actions,
            ends_at: self.ends_at,
            remaining_minutes: remaining,
        }
    }

    /// Final metrics for a completed campaign.
    ///
    /// The verified-action rate is the mean over participants who claimed at
    /// least once of `verified / claimed`; participants who never claimed do
    /// not drag the mean down. Top performers order by points, ties broken
    /// by earliest verified completion, then join order.
    pub fn summarize(&self, now: DateTime<Utc>, top_n: usize) -> RaidSummary {
        let mut rates = Vec::new();
        for p in &self.participants {
            let claimed = p.actions.len() as u32;
            if claimed > 0 {
                rates.push(f64::from(p.verified_actions) / f64::from(claimed));
            }
        }
        let mean_verified_rate = if rates.is_empty() {
            0.0
        } else {
            rates.iter().sum::<f64>() / rates.len() as f64
        };

        let mut ranked: Vec<&Participant> = self.participants.iter().collect();
        ranked.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| match (a.first_verified_at, b.first_verified_at) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.join_index.cmp(&b.join_index))
        });

        RaidSummary {
            campaign_id: self.id.clone(),
            target: self.target.clone(),
            status: self.status,
            participant_count: self.participants.len(),
            total_verified_actions: self.total_verified_actions,
            total_attempts: self.total_attempts,
            mean_verified_rate,
            duration_minutes: now.signed_duration_since(self.created_at).num_minutes(),
            top_performers: ranked
                .into_iter()
                .take(top_n)
                .map(|p| TopPerformer {
                    user_id: p.user_id.clone(),
                    display_name: p.display_name.clone(),
                    points: p.points,
                    verified_actions: p.verified_actions,
                })
                .collect(),
        }
    }

    /// Snapshot one participant as the persisted engagement record row.
    pub fn to_record(&self, participant: &Participant, now: DateTime<Utc>) -> EngagementRecord {
        EngagementRecord {
            id: participant.record_id.clone(),
            campaign_id: self.id.clone(),
            conversation_id: self.conversation_id.clone(),
            user_id: participant.user_id.clone(),
            display_name: participant.display_name.clone(),
            points: participant.points,
            verified_actions: participant.verified_actions,
            joined_at: rfc3339(participant.joined_at),
            first_verified_at: participant.first_verified_at.map(rfc3339),
            campaign_status: self.status.to_string(),
            recorded_at: rfc3339(now),
        }
    }
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Point-in-time campaign view.
#[derive(Debug, Clone, PartialEq)]
pub struct RaidProgress {
    pub campaign_id: String,
    pub conversation_id: String,
    pub target: String,
    pub status: RaidStatus,
    pub participant_count: usize,
    pub total_verified_actions: u32,
    pub ends_at: DateTime<Utc>,
    pub remaining_minutes: i64,
}

/// Final metrics computed once at the terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub struct RaidSummary {
    pub campaign_id: String,
    pub target: String,
    pub status: RaidStatus,
    pub participant_count: usize,
    pub total_verified_actions: u32,
    pub total_attempts: u32,
    /// Mean over claiming participants of verified/claimed.
    pub mean_verified_rate: f64,
    pub duration_minutes: i64,
    pub top_performers: Vec<TopPerformer>,
}

/// One row of the completion summary's top list.
#[derive(Debug, Clone, PartialEq)]
pub struct TopPerformer {
    pub user_id: String,
    pub display_name: String,
    pub points: u32,
    pub verified_actions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn participant(user_id: &str, join_index: usize) -> Participant {
        Participant {
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
            joined_at: t("2026-03-01T10:00:00Z"),
            join_index,
            record_id: format!("rec-{user_id}"),
            actions: Vec::new(),
            points: 0,
            verified_actions: 0,
            first_verified_at: None,
            early_bonus: false,
        }
    }

    fn campaign() -> RaidCampaign {
        RaidCampaign {
            id: "raid-1".to_string(),
            conversation_id: "conv-1".to_string(),
            target: "https://example.com/post/1".to_string(),
            status: RaidStatus::Active,
            scoring: ScoringConfig::default(),
            max_participants: 100,
            created_at: t("2026-03-01T10:00:00Z"),
            ends_at: t("2026-03-01T10:30:00Z"),
            participants: Vec::new(),
            total_verified_actions: 0,
            total_attempts: 0,
        }
    }

    #[test]
    fn status_terminality() {
        assert!(!RaidStatus::Active.is_terminal());
        assert!(RaidStatus::Completed.is_terminal());
        assert!(RaidStatus::Cancelled.is_terminal());
        assert_eq!(RaidStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn progress_clamps_remaining_time_at_zero() {
        let c = campaign();
        let before_end = c.progress_at(t("2026-03-01T10:10:00Z"));
        assert_eq!(before_end.remaining_minutes, 20);

        let after_end = c.progress_at(t("2026-03-01T11:00:00Z"));
        assert_eq!(after_end.remaining_minutes, 0);
    }

    #[test]
    fn summary_ranks_by_points_then_verified_time_then_join_order() {
        let mut c = campaign();

        let mut a = participant("alice", 0);
        a.points = 7;
        a.first_verified_at = Some(t("2026-03-01T10:20:00Z"));
        let mut b = participant("bob", 1);
        b.points = 7;
        b.first_verified_at = Some(t("2026-03-01T10:05:00Z"));
        let mut c3 = participant("carol", 2);
        c3.points = 7;
        let mut d = participant("dave", 3);
        d.points = 9;
        c.participants = vec![a, b, c3, d];

        let summary = c.summarize(t("2026-03-01T10:30:00Z"), 10);
        let order: Vec<&str> = summary
            .top_performers
            .iter()
            .map(|p| p.user_id.as_str())
            .collect();
        // dave leads on points; bob verified before alice; carol never verified.
        assert_eq!(order, vec!["dave", "bob", "alice", "carol"]);
        assert_eq!(summary.duration_minutes, 30);
    }

    #[test]
    fn summary_truncates_top_performers() {
        let mut c = campaign();
        for i in 0..5 {
            let mut p = participant(&format!("u{i}"), i);
            p.points = (10 - i) as u32;
            c.participants.push(p);
        }
        let summary = c.summarize(t("2026-03-01T10:30:00Z"), 3);
        assert_eq!(summary.top_performers.len(), 3);
        assert_eq!(summary.participant_count, 5);
    }

    #[test]
    fn mean_rate_ignores_participants_who_never_claimed() {
        let mut c = campaign();

        let mut a = participant("alice", 0);
        a.actions = vec![
            ClaimedAction {
                kind: ActionKind::Repost,
                claimed_at: t("2026-03-01T10:02:00Z"),
                verified: true,
                points_awarded: 3,
            },
            ClaimedAction {
                kind: ActionKind::Like,
                claimed_at: t("2026-03-01T10:03:00Z"),
                verified: false,
                points_awarded: 0,
            },
        ];
        a.verified_actions = 1;
        let b = participant("bob", 1); // joined, never claimed
        c.participants = vec![a, b];

        let summary = c.summarize(t("2026-03-01T10:30:00Z"), 10);
        assert!((summary.mean_verified_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_campaign_summary_is_all_zeroes() {
        let c = campaign();
        let summary = c.summarize(t("2026-03-01T10:30:00Z"), 10);
        assert_eq!(summary.participant_count, 0);
        assert_eq!(summary.mean_verified_rate, 0.0);
        assert!(summary.top_performers.is_empty());
    }

    #[test]
    fn record_snapshot_carries_status_and_rfc3339_times() {
        let mut c = campaign();
        let mut p = participant("alice", 0);
        p.points = 9;
        p.verified_actions = 2;
        p.first_verified_at = Some(t("2026-03-01T10:04:30Z"));
        c.participants.push(p);
        c.status = RaidStatus::Completed;

        let record = c.to_record(&c.participants[0], t("2026-03-01T10:30:00Z"));
        assert_eq!(record.id, "rec-alice");
        assert_eq!(record.campaign_id, "raid-1");
        assert_eq!(record.points, 9);
        assert_eq!(record.campaign_status, "completed");
        assert_eq!(record.joined_at, "2026-03-01T10:00:00.000Z");
        assert_eq!(
            record.first_verified_at.as_deref(),
            Some("2026-03-01T10:04:30.000Z")
        );
        assert_eq!(record.recorded_at, "2026-03-01T10:30:00.000Z");
    }

    #[test]
    fn has_verified_is_per_action_kind() {
        let mut p = participant("alice", 0);
        p.actions.push(ClaimedAction {
            kind: ActionKind::Repost,
            claimed_at: t("2026-03-01T10:02:00Z"),
            verified: true,
            points_awarded: 3,
        });
        p.actions.push(ClaimedAction {
            kind: ActionKind::Quote,
            claimed_at: t("2026-03-01T10:03:00Z"),
            verified: false,
            points_awarded: 0,
        });
        assert!(p.has_verified(ActionKind::Repost));
        assert!(!p.has_verified(ActionKind::Quote));
        assert!(!p.has_verified(ActionKind::Like));
    }
}
