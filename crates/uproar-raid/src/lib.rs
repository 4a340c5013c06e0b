// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raid campaign engine.
//!
//! Time-boxed group engagement campaigns: creation and duration bounds,
//! join admission with early-joiner bonuses, verifier-gated completion
//! scoring, periodic progress broadcasts, and the terminal summary. The
//! [`RaidCoordinator`] is the single entry point; everything else is the
//! domain vocabulary it speaks.

pub mod campaign;
pub mod coordinator;
pub mod scoring;
pub mod verifier;

pub use campaign::{RaidCampaign, RaidProgress, RaidStatus, RaidSummary, TopPerformer};
pub use coordinator::{
    CompleteOutcome, CompletionOutcome, CreateOutcome, JoinOutcome, RaidCoordinator, RaidEvent,
};
pub use scoring::ScoreBreakdown;
pub use verifier::TrustVerifier;
