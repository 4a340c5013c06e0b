// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Standings computation over engagement records.
//!
//! Everything here is read-side: rows come out of the record store, get
//! grouped by user, summed, sorted, and ranked. No locks and no writes, so
//! a standings query can never contend with an in-flight raid. The result
//! is eventually consistent with whatever the coordinator has committed.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::Display;
use tracing::debug;

use uproar_core::types::EngagementRecord;
use uproar_core::{RecordStore, UproarError};

use crate::window::StandingsWindow;

/// Title band derived from numeric rank alone.
///
/// A pure lookup, never stored: recomputing standings recomputes titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Title {
    Warlord,
    Commander,
    Captain,
    Vanguard,
    Raider,
    Striker,
    Contender,
    Participant,
}

impl Title {
    /// Map a 1-based rank to its band.
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => Title::Warlord,
            2 => Title::Commander,
            3 => Title::Captain,
            4..=10 => Title::Vanguard,
            11..=25 => Title::Raider,
            26..=50 => Title::Striker,
            51..=100 => Title::Contender,
            _ => Title::Participant,
        }
    }
}

/// One ranked row of the standings.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based rank within the queried window.
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    /// Total points across every campaign in the window.
    pub points: u32,
    /// Total verified actions across the window.
    pub verified_actions: u32,
    /// Number of campaigns the user appeared in.
    pub campaigns: usize,
    /// Highest single-campaign score in the window.
    pub best_campaign_points: u32,
    pub title: Title,
}

/// A computed standings snapshot.
#[derive(Debug, Clone)]
pub struct Standings {
    pub window: StandingsWindow,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}

impl Standings {
    /// True when the window holds no history at all. Callers render this as
    /// an explicit "no data yet" reply rather than treating it as a failure.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct UserTotals {
    display_name: String,
    points: u32,
    verified_actions: u32,
    campaigns: usize,
    best_campaign_points: u32,
    earliest_verified: Option<String>,
    earliest_joined: String,
    latest_recorded: String,
}

/// Group records by user and produce ranked entries, best first.
///
/// Ordering: total points descending, ties broken by earliest verified
/// completion (a user with any verified completion beats one with none),
/// then earliest join, then user id. The full key chain leaves no ties, so
/// rank is just position. `limit` truncates the tail after ranking.
pub fn aggregate(records: &[EngagementRecord], limit: Option<usize>) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&str, UserTotals> = HashMap::new();

    for record in records {
        let entry = totals
            .entry(record.user_id.as_str())
            .or_insert_with(|| UserTotals {
                display_name: record.display_name.clone(),
                points: 0,
                verified_actions: 0,
                campaigns: 0,
                best_campaign_points: 0,
                earliest_verified: None,
                earliest_joined: record.joined_at.clone(),
                latest_recorded: record.recorded_at.clone(),
            });
        entry.points += record.points;
        entry.verified_actions += record.verified_actions;
        entry.campaigns += 1;
        entry.best_campaign_points = entry.best_campaign_points.max(record.points);
        if let Some(verified_at) = &record.first_verified_at {
            match &entry.earliest_verified {
                Some(existing) if existing.as_str() <= verified_at.as_str() => {}
                _ => entry.earliest_verified = Some(verified_at.clone()),
            }
        }
        if record.joined_at < entry.earliest_joined {
            entry.earliest_joined = record.joined_at.clone();
        }
        // Display names drift; show the most recently recorded one.
        if record.recorded_at >= entry.latest_recorded {
            entry.latest_recorded = record.recorded_at.clone();
            entry.display_name = record.display_name.clone();
        }
    }

    let mut rows: Vec<(&str, UserTotals)> = totals.into_iter().collect();
    rows.sort_by(|(a_id, a), (b_id, b)| {
        b.points
            .cmp(&a.points)
            .then_with(|| cmp_verified(&a.earliest_verified, &b.earliest_verified))
            .then_with(|| a.earliest_joined.cmp(&b.earliest_joined))
            .then_with(|| a_id.cmp(b_id))
    });

    let take = limit.unwrap_or(rows.len());
    rows.into_iter()
        .take(take)
        .enumerate()
        .map(|(i, (user_id, totals))| {
            let rank = i + 1;
            LeaderboardEntry {
                rank,
                user_id: user_id.to_string(),
                display_name: totals.display_name,
                points: totals.points,
                verified_actions: totals.verified_actions,
                campaigns: totals.campaigns,
                best_campaign_points: totals.best_campaign_points,
                title: Title::for_rank(rank),
            }
        })
        .collect()
}

fn cmp_verified(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Read-side standings engine over the shared record store.
pub struct LeaderboardEngine {
    store: Arc<dyn RecordStore>,
}

impl LeaderboardEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Compute standings for `window`, keeping at most `limit` rows.
    ///
    /// Zero history is a valid result: the returned standings are empty and
    /// no error is raised.
    pub async fn standings(
        &self,
        window: StandingsWindow,
        limit: Option<usize>,
    ) -> Result<Standings, UproarError> {
        self.standings_at(window, limit, Utc::now()).await
    }

    async fn standings_at(
        &self,
        window: StandingsWindow,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<Standings, UproarError> {
        let cutoff = window.cutoff_from(now);
        let records = self.store.records_since(cutoff.as_deref()).await?;
        let entries = aggregate(&records, limit);
        debug!(
            window = %window,
            rows = records.len(),
            entries = entries.len(),
            "standings computed"
        );
        uproar_telemetry::record_standings(&window.to_string());
        Ok(Standings {
            window,
            generated_at: now,
            entries,
        })
    }
}
