// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uproar - an engagement raid coordination agent.
//!
//! This is the binary entry point for the Uproar agent.

mod serve;
mod standings;

use clap::{Parser, Subcommand};
use uproar_config::UproarConfig;

/// Uproar - an engagement raid coordination agent.
#[derive(Parser, Debug)]
#[command(name = "uproar", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Uproar agent.
    Serve,
    /// Print the engagement leaderboard for a time window.
    Standings {
        /// Window to rank: daily, weekly, monthly, or all.
        window: Option<String>,
    },
    /// Manage Uproar configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `uproar config` subcommands.
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate the configuration and print the resolved values.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match uproar_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            uproar_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Standings { window }) => {
            standings::run_standings(config, window.as_deref()).await
        }
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => {
            print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("uproar: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Prints the resolved configuration after validation passed.
fn print_config_summary(config: &UproarConfig) {
    println!("configuration OK");
    println!("  agent.name                = {}", config.agent.name);
    println!("  agent.log_level           = {}", config.agent.log_level);
    println!("  storage.backend           = {}", config.storage.backend);
    println!("  storage.database_path     = {}", config.storage.database_path);
    println!("  console.enabled           = {}", config.console.enabled);
    println!(
        "  gate.rate_limit           = {} msgs / {}s",
        config.gate.rate_limit_max_requests, config.gate.rate_limit_window_secs
    );
    println!(
        "  session.timeout_minutes   = {}",
        config.session.timeout_minutes
    );
    println!(
        "  raid.default_duration     = {} min",
        config.raid.default_duration_minutes
    );
    println!(
        "  raid.max_participants     = {}",
        config.raid.max_participants
    );
    println!(
        "  scoring.cap_per_raider    = {} pts",
        config.scoring.max_points_per_participant
    );
}
