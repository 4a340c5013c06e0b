// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leaderboard and scoring aggregation for the Uproar agent.
//!
//! Derived data only: standings are recomputed on demand from the
//! engagement record history and never stored back.

pub mod standings;
pub mod window;

pub use standings::{LeaderboardEngine, LeaderboardEntry, Standings, Title, aggregate};
pub use window::StandingsWindow;
