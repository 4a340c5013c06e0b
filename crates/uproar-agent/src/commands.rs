// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raid command grammar.
//!
//! Maps parsed bang-commands and button callback tokens onto a closed
//! [`RaidCommand`] set. Argument problems come back as
//! [`RaidCommand::Usage`] so the dispatcher replies with the exact line
//! to fix instead of a generic error.

use std::str::FromStr;

use uproar_core::types::ActionKind;
use uproar_leaderboard::StandingsWindow;
use uproar_pipeline::ParsedCommand;

pub const USAGE_RAID: &str = "usage: !raid <target-url> [minutes]";
pub const USAGE_DONE: &str = "usage: !done <repost|quote|reply|share|like|view>";
pub const USAGE_STANDINGS: &str = "usage: !standings [daily|weekly|monthly|all]";

/// An operational request aimed at the raid machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaidCommand {
    Create {
        target: String,
        duration_minutes: Option<u64>,
    },
    /// Join a specific campaign (button tap) or whatever is running in
    /// the conversation (bang-command).
    Join { campaign_id: Option<String> },
    Done {
        campaign_id: Option<String>,
        action: ActionKind,
    },
    Standings { window: StandingsWindow },
    Help,
    /// The command was recognized but its arguments were not.
    Usage(&'static str),
}

/// Interpret a parsed bang-command. `None` means the name is not part of
/// the raid grammar and the message stays conversational.
pub fn from_parsed(command: &ParsedCommand) -> Option<RaidCommand> {
    match command.name.as_str() {
        "raid" => Some(parse_create(&command.args)),
        "join" => Some(RaidCommand::Join { campaign_id: None }),
        "done" => Some(parse_done(&command.args)),
        "standings" | "leaderboard" => Some(parse_standings(&command.args)),
        "help" => Some(RaidCommand::Help),
        _ => None,
    }
}

/// Interpret a callback action token. `None` means the token belongs to
/// no known button.
pub fn from_callback(action: &str, params: &[String]) -> Option<RaidCommand> {
    match action {
        "raid:join" => Some(RaidCommand::Join {
            campaign_id: params.first().cloned(),
        }),
        "raid:done" => {
            let campaign_id = params.first().cloned();
            let kind = params.get(1).and_then(|p| ActionKind::from_str(p).ok());
            match kind {
                Some(action) => Some(RaidCommand::Done {
                    campaign_id,
                    action,
                }),
                None => Some(RaidCommand::Usage(USAGE_DONE)),
            }
        }
        "raid:standings" => Some(RaidCommand::Standings {
            window: StandingsWindow::default(),
        }),
        _ => None,
    }
}

fn parse_create(args: &[String]) -> RaidCommand {
    let Some(target) = args.first() else {
        return RaidCommand::Usage(USAGE_RAID);
    };
    if !is_target_url(target) {
        return RaidCommand::Usage(USAGE_RAID);
    }
    let duration_minutes = match args.get(1) {
        None => None,
        Some(raw) => match raw.parse::<u64>() {
            Ok(minutes) => Some(minutes),
            Err(_) => return RaidCommand::Usage(USAGE_RAID),
        },
    };
    RaidCommand::Create {
        target: target.clone(),
        duration_minutes,
    }
}

fn parse_done(args: &[String]) -> RaidCommand {
    match args.first().and_then(|a| ActionKind::from_str(a).ok()) {
        Some(action) => RaidCommand::Done {
            campaign_id: None,
            action,
        },
        None => RaidCommand::Usage(USAGE_DONE),
    }
}

fn parse_standings(args: &[String]) -> RaidCommand {
    match args.first() {
        None => RaidCommand::Standings {
            window: StandingsWindow::default(),
        },
        Some(raw) => match StandingsWindow::from_str(raw) {
            Ok(window) => RaidCommand::Standings { window },
            Err(_) => RaidCommand::Usage(USAGE_STANDINGS),
        },
    }
}

/// Raid targets must be plain http(s) URLs.
fn is_target_url(target: &str) -> bool {
    target.starts_with("https://") || target.starts_with("http://")
}
