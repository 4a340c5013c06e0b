// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `uproar standings` command implementation.
//!
//! Computes the leaderboard for a time window straight from the record
//! store and prints it as a table. Reads the same database the serve
//! command writes, so it works without a running agent.

use std::str::FromStr;

use uproar_config::UproarConfig;
use uproar_core::error::UproarError;
use uproar_leaderboard::{LeaderboardEngine, StandingsWindow};
use uproar_store::open_record_store;

/// Rows printed by the CLI table.
const CLI_LIMIT: usize = 20;

/// Runs the `uproar standings` command.
pub async fn run_standings(
    config: UproarConfig,
    window: Option<&str>,
) -> Result<(), UproarError> {
    let window = match window {
        Some(arg) => StandingsWindow::from_str(arg).map_err(|_| {
            UproarError::Config(format!(
                "unknown standings window `{arg}`, expected daily, weekly, monthly, or all"
            ))
        })?,
        None => StandingsWindow::All,
    };

    let store = open_record_store(&config.storage).await?;
    let engine = LeaderboardEngine::new(store.clone());
    let standings = engine.standings(window, Some(CLI_LIMIT)).await?;

    if standings.is_empty() {
        println!("no raid history for the {window} window yet");
    } else {
        println!("top raiders, {window} window");
        println!(
            "{:>4}  {:<20} {:>7} {:>9} {:>6}  title",
            "rank", "raider", "points", "verified", "raids"
        );
        for entry in &standings.entries {
            println!(
                "{:>4}  {:<20} {:>7} {:>9} {:>6}  {}",
                entry.rank,
                entry.display_name,
                entry.points,
                entry.verified_actions,
                entry.campaigns,
                entry.title
            );
        }
    }

    store.close().await?;
    Ok(())
}
