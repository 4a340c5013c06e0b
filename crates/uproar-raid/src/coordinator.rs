// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raid lifecycle coordination.
//!
//! `RaidCoordinator` owns every campaign: it validates creation, admits
//! joiners, runs completion claims through the verifier, and drives the
//! per-campaign clock that broadcasts progress and fires the deadline.
//! All campaign state sits behind one async mutex. The lock is never held
//! across verifier or store calls; a claim snapshots what it needs, runs
//! the verifier, then re-acquires and re-checks the campaign before it
//! commits, so a claim racing the deadline lands as not-active instead of
//! mutating a closed raid.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use uproar_config::model::{RaidConfig, ScoringConfig};
use uproar_core::types::{ActionKind, EngagementRecord, VerifierOutcome};
use uproar_core::{EngagementVerifier, RecordStore, UproarError};

use crate::campaign::{
    ClaimedAction, Participant, RaidCampaign, RaidProgress, RaidStatus, RaidSummary,
};
use crate::scoring::{self, ScoreBreakdown};

/// Rows shown in a completion summary.
const SUMMARY_TOP_N: usize = 3;

/// Push notifications for the chat surfaces.
#[derive(Debug, Clone)]
pub enum RaidEvent {
    /// Periodic progress while a campaign runs.
    StatusBroadcast(RaidProgress),
    /// A campaign hit its deadline or was completed by hand.
    Completed {
        conversation_id: String,
        summary: RaidSummary,
    },
    /// A campaign was torn down before its deadline.
    Cancelled {
        conversation_id: String,
        campaign_id: String,
        target: String,
    },
}

/// What happened to a create request.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created {
        campaign_id: String,
        ends_at: DateTime<Utc>,
    },
    /// Requested duration fell outside the configured bounds.
    InvalidDuration { given: u64, min: u64, max: u64 },
    /// The conversation already has a running raid.
    AlreadyRunning { campaign_id: String },
}

/// What happened to a join request.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined {
        /// 1-based position in join order.
        position: usize,
        early_bonus: bool,
        /// Points held right after joining.
        points: u32,
    },
    /// The user was already on the roster; nothing is double-counted.
    AlreadyJoined {
        position: usize,
        points: u32,
        verified_actions: u32,
    },
    NotFound,
    NotActive,
    Full { limit: usize },
}

/// What happened to a completion claim.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Verified {
        award: ScoreBreakdown,
        total_points: u32,
    },
    /// The verifier would not confirm the action; the claim stays retryable.
    Unverified {
        /// Claims of this kind so far, this one included.
        attempts: u32,
    },
    /// A verified claim of this kind was already credited.
    AlreadyCredited { kind: ActionKind, total_points: u32 },
    NotFound,
    NotJoined,
    NotActive,
}

/// What happened to an explicit terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    Completed(RaidSummary),
    Cancelled,
    NotFound,
    AlreadyTerminal,
}

#[derive(Default)]
struct CoordinatorState {
    campaigns: HashMap<String, RaidCampaign>,
    /// Conversation id to its single active campaign.
    active_by_conversation: HashMap<String, String>,
    /// Cancel handles for per-campaign clocks.
    clocks: HashMap<String, CancellationToken>,
}

struct Inner {
    config: RaidConfig,
    verifier: Arc<dyn EngagementVerifier>,
    store: Arc<dyn RecordStore>,
    events: mpsc::Sender<RaidEvent>,
    state: Mutex<CoordinatorState>,
    cancel: CancellationToken,
}

/// Shared handle over all raid campaigns. Cheap to clone; the clock tasks
/// hold their own handle.
#[derive(Clone)]
pub struct RaidCoordinator {
    inner: Arc<Inner>,
}

impl RaidCoordinator {
    pub fn new(
        config: RaidConfig,
        verifier: Arc<dyn EngagementVerifier>,
        store: Arc<dyn RecordStore>,
        events: mpsc::Sender<RaidEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                verifier,
                store,
                events,
                state: Mutex::new(CoordinatorState::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Open a campaign in a conversation and start its clock.
    ///
    /// A conversation carries at most one active raid; a second create
    /// reports the running campaign instead of stacking another. A missing
    /// duration falls back to the configured default.
    pub async fn create(
        &self,
        conversation_id: &str,
        target: &str,
        duration_minutes: Option<u64>,
        scoring: ScoringConfig,
    ) -> Result<CreateOutcome, UproarError> {
        let duration = duration_minutes.unwrap_or(self.inner.config.default_duration_minutes);
        if duration < self.inner.config.min_duration_minutes
            || duration > self.inner.config.max_duration_minutes
        {
            return Ok(CreateOutcome::InvalidDuration {
                given: duration,
                min: self.inner.config.min_duration_minutes,
                max: self.inner.config.max_duration_minutes,
            });
        }

        let now = Utc::now();
        let ends_at = now + chrono::Duration::minutes(duration as i64);
        let campaign_id = Uuid::new_v4().to_string();

        let clock_token = {
            let mut state = self.inner.state.lock().await;
            if let Some(existing) = state.active_by_conversation.get(conversation_id) {
                return Ok(CreateOutcome::AlreadyRunning {
                    campaign_id: existing.clone(),
                });
            }
            state.campaigns.insert(
                campaign_id.clone(),
                RaidCampaign {
                    id: campaign_id.clone(),
                    conversation_id: conversation_id.to_string(),
                    target: target.to_string(),
                    status: RaidStatus::Active,
                    scoring,
                    max_participants: self.inner.config.max_participants,
                    created_at: now,
                    ends_at,
                    participants: Vec::new(),
                    total_verified_actions: 0,
                    total_attempts: 0,
                },
            );
            state
                .active_by_conversation
                .insert(conversation_id.to_string(), campaign_id.clone());
            let token = self.inner.cancel.child_token();
            state.clocks.insert(campaign_id.clone(), token.clone());
            token
        };

        let clock = self.clone();
        let clock_id = campaign_id.clone();
        let run_for = Duration::from_secs(duration * 60);
        // interval() panics on a zero period, so floor it at one second.
        let broadcast_every = Duration::from_secs(self.inner.config.broadcast_interval_secs.max(1));
        tokio::spawn(async move {
            clock
                .run_campaign_clock(clock_id, run_for, broadcast_every, clock_token)
                .await;
        });

        uproar_telemetry::record_raid_started();
        self.refresh_active_gauge().await;
        info!(campaign_id = %campaign_id, url = target, duration_minutes = duration, "raid created");
        Ok(CreateOutcome::Created {
            campaign_id,
            ends_at,
        })
    }

    /// Admit a user into a campaign, applying the early-joiner bonus.
    ///
    /// Joining twice is idempotent: the second call reports the existing
    /// membership without touching the roster.
    pub async fn join(
        &self,
        campaign_id: &str,
        user_id: &str,
        display_name: &str,
    ) -> Result<JoinOutcome, UproarError> {
        let now = Utc::now();
        let (record, position, bonus) = {
            let mut state = self.inner.state.lock().await;
            let Some(campaign) = state.campaigns.get_mut(campaign_id) else {
                return Ok(JoinOutcome::NotFound);
            };
            if campaign.status.is_terminal() {
                return Ok(JoinOutcome::NotActive);
            }
            if let Some(existing) = campaign.participant(user_id) {
                return Ok(JoinOutcome::AlreadyJoined {
                    position: existing.join_index + 1,
                    points: existing.points,
                    verified_actions: existing.verified_actions,
                });
            }
            if campaign.participants.len() >= campaign.max_participants {
                return Ok(JoinOutcome::Full {
                    limit: campaign.max_participants,
                });
            }

            let join_index = campaign.participants.len();
            let bonus = scoring::early_joiner_bonus(&campaign.scoring, join_index);
            let participant = Participant {
                user_id: user_id.to_string(),
                display_name: display_name.to_string(),
                joined_at: now,
                join_index,
                record_id: Uuid::new_v4().to_string(),
                actions: Vec::new(),
                points: bonus,
                verified_actions: 0,
                first_verified_at: None,
                early_bonus: bonus > 0,
            };
            let record = campaign.to_record(&participant, now);
            campaign.participants.push(participant);
            (record, join_index + 1, bonus)
        };

        self.persist(&record, "join").await;
        uproar_telemetry::record_raid_join();
        debug!(campaign_id, user_id, position, "participant joined raid");
        Ok(JoinOutcome::Joined {
            position,
            early_bonus: bonus > 0,
            points: bonus,
        })
    }

    /// Join whatever campaign is running in the conversation.
    pub async fn join_active(
        &self,
        conversation_id: &str,
        user_id: &str,
        display_name: &str,
    ) -> Result<JoinOutcome, UproarError> {
        match self.active_campaign_for(conversation_id).await {
            Some(id) => self.join(&id, user_id, display_name).await,
            None => Ok(JoinOutcome::NotFound),
        }
    }

    /// Run a completion claim through the verifier and credit the result.
    ///
    /// A verified verdict awards the action weight plus the speed bonus
    /// (first verified completion inside the window) and the verification
    /// bonus. An unverified verdict records the attempt and leaves the
    /// claim retryable. Each action kind is credited at most once per
    /// participant.
    pub async fn record_completion(
        &self,
        campaign_id: &str,
        user_id: &str,
        kind: ActionKind,
    ) -> Result<CompletionOutcome, UproarError> {
        let target = {
            let state = self.inner.state.lock().await;
            let Some(campaign) = state.campaigns.get(campaign_id) else {
                return Ok(CompletionOutcome::NotFound);
            };
            if campaign.status.is_terminal() {
                return Ok(CompletionOutcome::NotActive);
            }
            let Some(p) = campaign.participant(user_id) else {
                return Ok(CompletionOutcome::NotJoined);
            };
            if p.has_verified(kind) {
                return Ok(CompletionOutcome::AlreadyCredited {
                    kind,
                    total_points: p.points,
                });
            }
            campaign.target.clone()
        };

        let verdict = self.verify_with_timeout(&target, user_id, kind).await;
        let claimed_at = Utc::now();

        let (record, outcome) = {
            let mut state = self.inner.state.lock().await;
            let Some(campaign) = state.campaigns.get_mut(campaign_id) else {
                return Ok(CompletionOutcome::NotFound);
            };
            if campaign.status.is_terminal() {
                // The raid closed while the verifier ran; drop the attempt.
                return Ok(CompletionOutcome::NotActive);
            }
            let scoring_cfg = campaign.scoring.clone();
            let Some(idx) = campaign
                .participants
                .iter()
                .position(|p| p.user_id == user_id)
            else {
                return Ok(CompletionOutcome::NotJoined);
            };
            if campaign.participants[idx].has_verified(kind) {
                return Ok(CompletionOutcome::AlreadyCredited {
                    kind,
                    total_points: campaign.participants[idx].points,
                });
            }

            campaign.total_attempts += 1;
            if verdict.verified {
                let award = scoring::award_for_verified_action(
                    &scoring_cfg,
                    kind,
                    verdict.weight,
                    campaign.participants[idx].joined_at,
                    claimed_at,
                    campaign.participants[idx].first_verified_at.is_none(),
                    campaign.participants[idx].points,
                );
                let p = &mut campaign.participants[idx];
                p.actions.push(ClaimedAction {
                    kind,
                    claimed_at,
                    verified: true,
                    points_awarded: award.granted,
                });
                p.points += award.granted;
                p.verified_actions += 1;
                if p.first_verified_at.is_none() {
                    p.first_verified_at = Some(claimed_at);
                }
                let total_points = p.points;
                campaign.total_verified_actions += 1;
                let record = campaign.to_record(&campaign.participants[idx], claimed_at);
                (
                    Some(record),
                    CompletionOutcome::Verified {
                        award,
                        total_points,
                    },
                )
            } else {
                let p = &mut campaign.participants[idx];
                p.actions.push(ClaimedAction {
                    kind,
                    claimed_at,
                    verified: false,
                    points_awarded: 0,
                });
                let attempts = p.actions.iter().filter(|a| a.kind == kind).count() as u32;
                (None, CompletionOutcome::Unverified { attempts })
            }
        };

        if let Some(record) = &record {
            self.persist(record, "completion").await;
        }
        let label = if matches!(outcome, CompletionOutcome::Verified { .. }) {
            "verified"
        } else {
            "unverified"
        };
        uproar_telemetry::record_completion(&kind.to_string(), label);
        Ok(outcome)
    }

    /// Close a campaign and emit its summary.
    pub async fn complete(&self, campaign_id: &str) -> Result<CompleteOutcome, UproarError> {
        self.finish(campaign_id, RaidStatus::Completed).await
    }

    /// Tear a campaign down before its deadline. No summary is produced.
    pub async fn cancel(&self, campaign_id: &str) -> Result<CompleteOutcome, UproarError> {
        self.finish(campaign_id, RaidStatus::Cancelled).await
    }

    async fn finish(
        &self,
        campaign_id: &str,
        terminal: RaidStatus,
    ) -> Result<CompleteOutcome, UproarError> {
        let now = Utc::now();
        let (records, event, outcome) = {
            let mut state = self.inner.state.lock().await;
            let Some(campaign) = state.campaigns.get_mut(campaign_id) else {
                return Ok(CompleteOutcome::NotFound);
            };
            if campaign.status.is_terminal() {
                return Ok(CompleteOutcome::AlreadyTerminal);
            }
            campaign.status = terminal;
            let campaign = &*campaign;

            let conversation_id = campaign.conversation_id.clone();
            let records: Vec<EngagementRecord> = campaign
                .participants
                .iter()
                .map(|p| campaign.to_record(p, now))
                .collect();
            let (event, outcome) = if terminal == RaidStatus::Completed {
                let summary = campaign.summarize(now, SUMMARY_TOP_N);
                (
                    RaidEvent::Completed {
                        conversation_id: conversation_id.clone(),
                        summary: summary.clone(),
                    },
                    CompleteOutcome::Completed(summary),
                )
            } else {
                (
                    RaidEvent::Cancelled {
                        conversation_id: conversation_id.clone(),
                        campaign_id: campaign_id.to_string(),
                        target: campaign.target.clone(),
                    },
                    CompleteOutcome::Cancelled,
                )
            };

            state.active_by_conversation.remove(&conversation_id);
            if let Some(token) = state.clocks.remove(campaign_id) {
                token.cancel();
            }
            (records, event, outcome)
        };

        for record in &records {
            self.persist(record, "finish").await;
        }
        if self.inner.events.send(event).await.is_err() {
            warn!(campaign_id, "terminal raid event dropped; no consumer");
        }
        uproar_telemetry::record_raid_finished(if terminal == RaidStatus::Completed {
            "completed"
        } else {
            "cancelled"
        });
        self.refresh_active_gauge().await;
        info!(campaign_id, status = %terminal, "raid reached terminal state");
        Ok(outcome)
    }

    /// Point-in-time progress for one campaign.
    pub async fn progress(&self, campaign_id: &str) -> Option<RaidProgress> {
        let state = self.inner.state.lock().await;
        state
            .campaigns
            .get(campaign_id)
            .map(|c| c.progress_at(Utc::now()))
    }

    /// The running campaign in a conversation, if any.
    pub async fn active_campaign_for(&self, conversation_id: &str) -> Option<String> {
        let state = self.inner.state.lock().await;
        state.active_by_conversation.get(conversation_id).cloned()
    }

    /// Progress for the conversation's running campaign, if any.
    pub async fn active_progress_for(&self, conversation_id: &str) -> Option<RaidProgress> {
        let state = self.inner.state.lock().await;
        let id = state.active_by_conversation.get(conversation_id)?;
        state.campaigns.get(id).map(|c| c.progress_at(Utc::now()))
    }

    /// Number of campaigns still running.
    pub async fn active_count(&self) -> usize {
        let state = self.inner.state.lock().await;
        state
            .campaigns
            .values()
            .filter(|c| c.status == RaidStatus::Active)
            .count()
    }

    /// Stop every campaign clock. Campaign state stays readable.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Per-campaign background task: periodic progress broadcasts until the
    /// deadline fires, then one completion. The token stops the clock when
    /// the campaign settles early or the process shuts down.
    async fn run_campaign_clock(
        self,
        campaign_id: String,
        run_for: Duration,
        broadcast_every: Duration,
        token: CancellationToken,
    ) {
        let deadline = tokio::time::sleep(run_for);
        tokio::pin!(deadline);
        let mut broadcast = tokio::time::interval(broadcast_every);
        // Skip the first immediate tick.
        broadcast.tick().await;

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    match self.complete(&campaign_id).await {
                        Ok(CompleteOutcome::Completed(_)) => {
                            debug!(campaign_id = %campaign_id, "raid clock fired the deadline");
                        }
                        Ok(_) => {
                            debug!(campaign_id = %campaign_id, "raid clock found the campaign already settled");
                        }
                        Err(e) => {
                            warn!(campaign_id = %campaign_id, error = %e, "raid clock failed to complete the campaign");
                        }
                    }
                    break;
                }
                _ = broadcast.tick() => {
                    self.broadcast_progress(&campaign_id).await;
                }
                _ = token.cancelled() => {
                    debug!(campaign_id = %campaign_id, "raid clock stopped");
                    break;
                }
            }
        }
    }

    /// Push a progress event if the campaign is still active.
    ///
    /// A full or closed event channel skips this broadcast; the raid never
    /// stalls on a slow consumer.
    async fn broadcast_progress(&self, campaign_id: &str) {
        let progress = {
            let state = self.inner.state.lock().await;
            state
                .campaigns
                .get(campaign_id)
                .filter(|c| c.status == RaidStatus::Active)
                .map(|c| c.progress_at(Utc::now()))
        };
        if let Some(progress) = progress {
            if let Err(e) = self
                .inner
                .events
                .try_send(RaidEvent::StatusBroadcast(progress))
            {
                warn!(campaign_id, error = %e, "progress broadcast skipped");
            }
        }
    }

    /// Call the verifier with the configured deadline. Timeouts and
    /// verifier errors both fall back to an unverified verdict instead of
    /// failing the claim.
    async fn verify_with_timeout(
        &self,
        target: &str,
        user_id: &str,
        kind: ActionKind,
    ) -> VerifierOutcome {
        let deadline = Duration::from_secs(self.inner.config.verifier_timeout_secs);
        let started = Instant::now();
        let verdict = match tokio::time::timeout(
            deadline,
            self.inner.verifier.verify(target, user_id, kind),
        )
        .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(user_id, action = %kind, error = %e, "verifier error; claim treated as unverified");
                VerifierOutcome::unverified()
            }
            Err(_) => {
                warn!(
                    user_id,
                    action = %kind,
                    timeout_secs = self.inner.config.verifier_timeout_secs,
                    "verifier timed out; claim treated as unverified"
                );
                VerifierOutcome::unverified()
            }
        };
        uproar_telemetry::record_verifier_latency(started.elapsed().as_secs_f64());
        verdict
    }

    /// Write one record snapshot, degrading to a warning on failure.
    ///
    /// Campaign state is already committed in memory. The next snapshot of
    /// the same row carries the full totals again, so a lost write heals on
    /// the following operation.
    async fn persist(&self, record: &EngagementRecord, op: &'static str) {
        if let Err(e) = self.inner.store.upsert_record(record).await {
            uproar_telemetry::record_store_failure();
            warn!(
                campaign_id = %record.campaign_id,
                user_id = %record.user_id,
                op,
                error = %e,
                "record write failed; state kept in memory"
            );
        }
    }

    async fn refresh_active_gauge(&self) {
        uproar_telemetry::set_active_raids(self.active_count().await as f64);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use tokio::time::{advance, timeout};

    use uproar_core::types::{AdapterType, HealthStatus};
    use uproar_core::PluginAdapter;
    use uproar_store::MemoryRecordStore;

    use crate::verifier::TrustVerifier;

    use super::*;

    fn test_config() -> RaidConfig {
        RaidConfig {
            max_participants: 3,
            min_duration_minutes: 0,
            max_duration_minutes: 120,
            default_duration_minutes: 30,
            broadcast_interval_secs: 25,
            verifier_timeout_secs: 5,
        }
    }

    /// Verifier returning a scripted verdict queue; verified once empty.
    struct ScriptedVerifier {
        verdicts: Mutex<VecDeque<VerifierOutcome>>,
        delay: Option<Duration>,
    }

    impl ScriptedVerifier {
        fn new(verdicts: Vec<VerifierOutcome>) -> Self {
            Self {
                verdicts: Mutex::new(VecDeque::from(verdicts)),
                delay: None,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                verdicts: Mutex::new(VecDeque::new()),
                delay: Some(delay),
            }
        }
    }

    #[async_trait::async_trait]
    impl PluginAdapter for ScriptedVerifier {
        fn name(&self) -> &str {
            "scripted"
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

    #[async_trait::async_trait]
    impl EngagementVerifier for ScriptedVerifier {
        async fn verify(
            &self,
            _target: &str,
            _user_id: &str,
            _action: ActionKind,
        ) -> Result<VerifierOutcome, UproarError> {
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

    /// Store whose writes always fail, for degradation tests.
    struct FailingStore;

    #[async_trait::async_trait]
    impl PluginAdapter for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }

        async fn health_check(&self) -> Result<HealthStatus, UproarError> {
            Ok(HealthStatus::Healthy)
        }

        async fn shutdown(&self) -> Result<(), UproarError> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl RecordStore for FailingStore {
        async fn initialize(&self) -> Result<(), UproarError> {
            Ok(())
        }

        async fn upsert_record(&self, _record: &EngagementRecord) -> Result<(), UproarError> {
            Err(UproarError::Storage {
                source: Box::new(std::io::Error::other("disk gone")),
            })
        }

        async fn records_since(
            &self,
            _cutoff: Option<&str>,
        ) -> Result<Vec<EngagementRecord>, UproarError> {
            Ok(Vec::new())
        }

        async fn records_for_campaign(
            &self,
            _campaign_id: &str,
        ) -> Result<Vec<EngagementRecord>, UproarError> {
            Ok(Vec::new())
        }

        async fn close(&self) -> Result<(), UproarError> {
            Ok(())
        }
    }

    async fn coordinator(
        verifier: Arc<dyn EngagementVerifier>,
    ) -> (
        RaidCoordinator,
        mpsc::Receiver<RaidEvent>,
        Arc<MemoryRecordStore>,
    ) {
        let store = Arc::new(MemoryRecordStore::new());
        let (tx, rx) = mpsc::channel(16);
        let raids = RaidCoordinator::new(test_config(), verifier, store.clone(), tx);
        (raids, rx, store)
    }

    async fn created_campaign(raids: &RaidCoordinator, conversation: &str) -> String {
        match raids
            .create(
                conversation,
                "https://example.com/p/1",
                Some(30),
                ScoringConfig::default(),
            )
            .await
            .unwrap()
        {
            CreateOutcome::Created { campaign_id, .. } => campaign_id,
            other => panic!("expected created, got {other:?}"),
        }
    }

    fn summary_of(outcome: CompleteOutcome) -> RaidSummary {
        match outcome {
            CompleteOutcome::Completed(summary) => summary,
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_applies_the_default_duration() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let outcome = raids
            .create("conv-1", "https://example.com/p/1", None, ScoringConfig::default())
            .await
            .unwrap();

        match outcome {
            CreateOutcome::Created { ends_at, .. } => {
                let now = Utc::now();
                assert!(ends_at > now + chrono::Duration::minutes(29));
                assert!(ends_at < now + chrono::Duration::minutes(31));
            }
            other => panic!("expected created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_durations_outside_the_bounds() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let outcome = raids
            .create(
                "conv-1",
                "https://example.com/p/1",
                Some(500),
                ScoringConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CreateOutcome::InvalidDuration {
                given: 500,
                min: 0,
                max: 120
            }
        );
        assert_eq!(raids.active_count().await, 0);
    }

    #[tokio::test]
    async fn one_active_raid_per_conversation() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let first = created_campaign(&raids, "conv-1").await;

        let second = raids
            .create(
                "conv-1",
                "https://example.com/p/2",
                Some(30),
                ScoringConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            second,
            CreateOutcome::AlreadyRunning {
                campaign_id: first.clone()
            }
        );

        // Another conversation raids independently.
        let elsewhere = created_campaign(&raids, "conv-2").await;
        assert_ne!(elsewhere, first);

        // Once settled, the conversation is free again.
        raids.complete(&first).await.unwrap();
        let replacement = created_campaign(&raids, "conv-1").await;
        assert_ne!(replacement, first);
    }

    #[tokio::test]
    async fn join_reports_missing_and_closed_campaigns() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        assert_eq!(
            raids.join("no-such-raid", "alice", "Alice").await.unwrap(),
            JoinOutcome::NotFound
        );

        let id = created_campaign(&raids, "conv-1").await;
        raids.complete(&id).await.unwrap();
        assert_eq!(
            raids.join(&id, "alice", "Alice").await.unwrap(),
            JoinOutcome::NotActive
        );
    }

    #[tokio::test]
    async fn joining_twice_returns_the_existing_membership() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;

        let first = raids.join(&id, "alice", "Alice").await.unwrap();
        assert_eq!(
            first,
            JoinOutcome::Joined {
                position: 1,
                early_bonus: true,
                points: 2
            }
        );

        let again = raids.join(&id, "alice", "Alice").await.unwrap();
        assert_eq!(
            again,
            JoinOutcome::AlreadyJoined {
                position: 1,
                points: 2,
                verified_actions: 0
            }
        );

        let progress = raids.progress(&id).await.unwrap();
        assert_eq!(progress.participant_count, 1);
    }

    #[tokio::test]
    async fn roster_cap_rejects_the_overflow_joiner() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;

        for user in ["alice", "bob", "carol"] {
            assert!(matches!(
                raids.join(&id, user, user).await.unwrap(),
                JoinOutcome::Joined { .. }
            ));
        }
        assert_eq!(
            raids.join(&id, "dave", "Dave").await.unwrap(),
            JoinOutcome::Full { limit: 3 }
        );
    }

    #[tokio::test]
    async fn fast_first_action_earns_the_full_bonus_stack() {
        let (raids, _rx, store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;

        // Early joiner bonus lands immediately.
        raids.join(&id, "alice", "Alice").await.unwrap();

        // Repost weight 3, speed bonus 3, verification bonus 1, on top of
        // the early joiner bonus 2.
        let outcome = raids
            .record_completion(&id, "alice", ActionKind::Repost)
            .await
            .unwrap();
        match outcome {
            CompletionOutcome::Verified {
                award,
                total_points,
            } => {
                assert_eq!(award.base, 3);
                assert_eq!(award.speed_bonus, 3);
                assert_eq!(award.verification_bonus, 1);
                assert_eq!(award.granted, 7);
                assert!(!award.capped);
                assert_eq!(total_points, 9);
            }
            other => panic!("expected verified, got {other:?}"),
        }

        let rows = store.records_for_campaign(&id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].points, 9);
        assert_eq!(rows[0].verified_actions, 1);
        assert!(rows[0].first_verified_at.is_some());
    }

    #[tokio::test]
    async fn verifier_weight_override_feeds_the_base() {
        let scripted = ScriptedVerifier::new(vec![VerifierOutcome {
            verified: true,
            weight: Some(5),
        }]);
        let (raids, _rx, _store) = coordinator(Arc::new(scripted)).await;
        let id = created_campaign(&raids, "conv-1").await;
        raids.join(&id, "alice", "Alice").await.unwrap();

        let outcome = raids
            .record_completion(&id, "alice", ActionKind::Like)
            .await
            .unwrap();
        match outcome {
            CompletionOutcome::Verified { award, .. } => assert_eq!(award.base, 5),
            other => panic!("expected verified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unverified_claims_stay_retryable() {
        let scripted = ScriptedVerifier::new(vec![VerifierOutcome::unverified()]);
        let (raids, _rx, _store) = coordinator(Arc::new(scripted)).await;
        let id = created_campaign(&raids, "conv-1").await;
        raids.join(&id, "alice", "Alice").await.unwrap();

        let first = raids
            .record_completion(&id, "alice", ActionKind::Repost)
            .await
            .unwrap();
        assert_eq!(first, CompletionOutcome::Unverified { attempts: 1 });

        // Queue exhausted; the retry verifies.
        let retry = raids
            .record_completion(&id, "alice", ActionKind::Repost)
            .await
            .unwrap();
        assert!(matches!(retry, CompletionOutcome::Verified { .. }));

        let summary = summary_of(raids.complete(&id).await.unwrap());
        assert_eq!(summary.total_attempts, 2);
        assert_eq!(summary.total_verified_actions, 1);
    }

    #[tokio::test]
    async fn repeat_verified_claims_are_not_double_credited() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;
        raids.join(&id, "alice", "Alice").await.unwrap();

        raids
            .record_completion(&id, "alice", ActionKind::Repost)
            .await
            .unwrap();
        let repeat = raids
            .record_completion(&id, "alice", ActionKind::Repost)
            .await
            .unwrap();
        assert_eq!(
            repeat,
            CompletionOutcome::AlreadyCredited {
                kind: ActionKind::Repost,
                total_points: 9
            }
        );

        // A different kind still credits, but the speed bonus was spent on
        // the first verified completion.
        let quote = raids
            .record_completion(&id, "alice", ActionKind::Quote)
            .await
            .unwrap();
        match quote {
            CompletionOutcome::Verified {
                award,
                total_points,
            } => {
                assert_eq!(award.speed_bonus, 0);
                assert_eq!(award.granted, 4); // weight 3 + verification 1
                assert_eq!(total_points, 13);
            }
            other => panic!("expected verified, got {other:?}"),
        }

        let summary = summary_of(raids.complete(&id).await.unwrap());
        assert_eq!(summary.total_attempts, 2); // rejected duplicate is not an attempt
    }

    #[tokio::test]
    async fn claims_after_the_deadline_land_not_active() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;
        raids.join(&id, "alice", "Alice").await.unwrap();
        raids.complete(&id).await.unwrap();

        assert_eq!(
            raids
                .record_completion(&id, "alice", ActionKind::Repost)
                .await
                .unwrap(),
            CompletionOutcome::NotActive
        );
    }

    #[tokio::test]
    async fn complete_settles_exactly_once() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;

        assert!(matches!(
            raids.complete(&id).await.unwrap(),
            CompleteOutcome::Completed(_)
        ));
        assert_eq!(
            raids.complete(&id).await.unwrap(),
            CompleteOutcome::AlreadyTerminal
        );
        assert_eq!(
            raids.cancel(&id).await.unwrap(),
            CompleteOutcome::AlreadyTerminal
        );
        assert_eq!(
            raids.complete("no-such-raid").await.unwrap(),
            CompleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn completion_event_carries_summary_and_records_go_terminal() {
        let (raids, mut rx, store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;
        raids.join(&id, "alice", "Alice").await.unwrap();
        raids.join(&id, "bob", "Bob").await.unwrap();
        raids
            .record_completion(&id, "alice", ActionKind::Repost)
            .await
            .unwrap();

        raids.complete(&id).await.unwrap();

        match rx.recv().await.unwrap() {
            RaidEvent::Completed {
                conversation_id,
                summary,
            } => {
                assert_eq!(conversation_id, "conv-1");
                assert_eq!(summary.participant_count, 2);
                assert_eq!(summary.top_performers[0].user_id, "alice");
            }
            other => panic!("expected completed event, got {other:?}"),
        }

        let rows = store.records_for_campaign(&id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.campaign_status == "completed"));
    }

    #[tokio::test]
    async fn cancel_skips_the_summary() {
        let (raids, mut rx, store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;
        raids.join(&id, "alice", "Alice").await.unwrap();

        assert_eq!(raids.cancel(&id).await.unwrap(), CompleteOutcome::Cancelled);

        match rx.recv().await.unwrap() {
            RaidEvent::Cancelled {
                conversation_id,
                target,
                ..
            } => {
                assert_eq!(conversation_id, "conv-1");
                assert_eq!(target, "https://example.com/p/1");
            }
            other => panic!("expected cancelled event, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());

        let rows = store.records_for_campaign(&id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].campaign_status, "cancelled");
    }

    #[tokio::test]
    async fn store_failures_do_not_block_the_raid() {
        let store = Arc::new(FailingStore);
        let (tx, _rx) = mpsc::channel(16);
        let raids =
            RaidCoordinator::new(test_config(), Arc::new(TrustVerifier), store, tx);
        let id = created_campaign(&raids, "conv-1").await;

        assert!(matches!(
            raids.join(&id, "alice", "Alice").await.unwrap(),
            JoinOutcome::Joined { .. }
        ));
        assert!(matches!(
            raids
                .record_completion(&id, "alice", ActionKind::Repost)
                .await
                .unwrap(),
            CompletionOutcome::Verified { .. }
        ));

        let progress = raids.progress(&id).await.unwrap();
        assert_eq!(progress.participant_count, 1);
        assert_eq!(progress.total_verified_actions, 1);
    }

    #[tokio::test]
    async fn join_active_resolves_the_running_campaign() {
        let (raids, _rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;

        assert!(matches!(
            raids.join_active("conv-1", "alice", "Alice").await.unwrap(),
            JoinOutcome::Joined { .. }
        ));
        assert_eq!(
            raids.join_active("conv-2", "bob", "Bob").await.unwrap(),
            JoinOutcome::NotFound
        );
        assert_eq!(raids.active_campaign_for("conv-1").await, Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_verifier_times_out_into_unverified() {
        // Ten seconds of verifier latency against a five second budget.
        let scripted = ScriptedVerifier::slow(Duration::from_secs(10));
        let (raids, _rx, _store) = coordinator(Arc::new(scripted)).await;
        let id = created_campaign(&raids, "conv-1").await;
        raids.join(&id, "alice", "Alice").await.unwrap();

        let outcome = raids
            .record_completion(&id, "alice", ActionKind::Repost)
            .await
            .unwrap();
        assert_eq!(outcome, CompletionOutcome::Unverified { attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_clock_completes_the_raid() {
        let (raids, mut rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let outcome = raids
            .create(
                "conv-1",
                "https://example.com/p/1",
                Some(0),
                ScoringConfig::default(),
            )
            .await
            .unwrap();
        let id = match outcome {
            CreateOutcome::Created { campaign_id, .. } => campaign_id,
            other => panic!("expected created, got {other:?}"),
        };

        match rx.recv().await.unwrap() {
            RaidEvent::Completed {
                conversation_id, ..
            } => assert_eq!(conversation_id, "conv-1"),
            other => panic!("expected completed event, got {other:?}"),
        }
        assert_eq!(
            raids.join(&id, "alice", "Alice").await.unwrap(),
            JoinOutcome::NotActive
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clock_broadcasts_progress_between_ticks() {
        let (raids, mut rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let outcome = raids
            .create(
                "conv-1",
                "https://example.com/p/1",
                Some(1),
                ScoringConfig::default(),
            )
            .await
            .unwrap();
        let id = match outcome {
            CreateOutcome::Created { campaign_id, .. } => campaign_id,
            other => panic!("expected created, got {other:?}"),
        };
        raids.join(&id, "alice", "Alice").await.unwrap();

        // Broadcasts at 25s and 50s, then the deadline at 60s.
        let mut broadcasts = 0;
        loop {
            match rx.recv().await.unwrap() {
                RaidEvent::StatusBroadcast(progress) => {
                    assert_eq!(progress.participant_count, 1);
                    broadcasts += 1;
                }
                RaidEvent::Completed { .. } => break,
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(broadcasts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_campaigns_silence_the_stale_clock() {
        let (raids, mut rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        let id = created_campaign(&raids, "conv-1").await;

        raids.complete(&id).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            RaidEvent::Completed { .. }
        ));

        // Run past the original deadline; the dead clock stays quiet.
        advance(Duration::from_secs(31 * 60)).await;
        assert!(
            timeout(Duration::from_millis(50), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_every_clock() {
        let (raids, mut rx, _store) = coordinator(Arc::new(TrustVerifier)).await;
        created_campaign(&raids, "conv-1").await;
        created_campaign(&raids, "conv-2").await;

        raids.shutdown();
        advance(Duration::from_secs(31 * 60)).await;

        assert!(
            timeout(Duration::from_millis(50), rx.recv())
                .await
                .is_err()
        );
        // State stays readable for a final flush.
        assert_eq!(raids.active_count().await, 2);
    }
}
