// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing reply text.
//!
//! Every outcome the dispatcher can produce renders here, as pure
//! functions over the raid and leaderboard result types. Keeping the
//! wording in one place keeps the dispatcher logic readable and the
//! strings testable.

use uproar_core::types::ActionKind;
use uproar_leaderboard::Standings;
use uproar_pipeline::Intent;
use uproar_raid::{
    CompletionOutcome, CreateOutcome, JoinOutcome, RaidProgress, RaidSummary,
};

pub fn help() -> &'static str {
    "Commands:\n\
     !raid <target-url> [minutes] - start a raid on a post\n\
     !join - join the running raid\n\
     !done <repost|quote|reply|share|like|view> - claim a completed action\n\
     !standings [daily|weekly|monthly|all] - show the leaderboard\n\
     !help - this message"
}

pub fn create_outcome(outcome: &CreateOutcome, target: &str) -> String {
    match outcome {
        CreateOutcome::Created { .. } => format!(
            "🚀 Raid is live! Target: {target}\nSmash Join or send !join, then claim actions with !done <kind>."
        ),
        CreateOutcome::InvalidDuration { given, min, max } => format!(
            "Raid length must be between {min} and {max} minutes (you asked for {given})."
        ),
        CreateOutcome::AlreadyRunning { .. } => {
            "There's already a raid running here. Join that one instead!".to_string()
        }
    }
}

pub fn join_outcome(outcome: &JoinOutcome) -> String {
    match outcome {
        JoinOutcome::Joined {
            position,
            early_bonus: true,
            points,
        } => format!(
            "You're in! Raider #{position}, early-bird bonus +{points} pts banked. Claim actions with !done <kind>."
        ),
        JoinOutcome::Joined { position, .. } => format!(
            "You're in! Raider #{position}. Claim actions with !done <kind>."
        ),
        JoinOutcome::AlreadyJoined {
            position, points, ..
        } => format!("You're already on the roster (#{position}, {points} pts)."),
        JoinOutcome::NotFound => {
            "No raid to join right now. Start one with !raid <target-url>.".to_string()
        }
        JoinOutcome::NotActive => "That raid has wrapped. Watch for the next one!".to_string(),
        JoinOutcome::Full { limit } => {
            format!("Roster is full ({limit} raiders). Catch the next one!")
        }
    }
}

pub fn completion_outcome(kind: ActionKind, outcome: &CompletionOutcome) -> String {
    match outcome {
        CompletionOutcome::Verified {
            award,
            total_points,
        } => {
            let mut parts = format!("base {}", award.base);
            if award.speed_bonus > 0 {
                parts.push_str(&format!(", speed +{}", award.speed_bonus));
            }
            if award.verification_bonus > 0 {
                parts.push_str(&format!(", verified +{}", award.verification_bonus));
            }
            let capped = if award.capped { ", capped" } else { "" };
            format!(
                "✅ {kind} verified! +{} pts ({parts}{capped}). Total: {total_points} pts.",
                award.granted
            )
        }
        CompletionOutcome::Unverified { attempts } => format!(
            "Couldn't verify your {kind} yet (attempt {attempts}). Give the platform a minute and try again."
        ),
        CompletionOutcome::AlreadyCredited { kind, total_points } => {
            format!("Your {kind} is already credited. Total: {total_points} pts.")
        }
        CompletionOutcome::NotJoined => "Join the raid first: !join.".to_string(),
        CompletionOutcome::NotActive => "This raid already ended.".to_string(),
        CompletionOutcome::NotFound => "No active raid here.".to_string(),
    }
}

pub fn progress_line(progress: &RaidProgress) -> String {
    format!(
        "⚡ Raid on {}: {} raiders, {} verified actions, {} min left. !join to pile in.",
        progress.target,
        progress.participant_count,
        progress.total_verified_actions,
        progress.remaining_minutes.max(0)
    )
}

pub fn summary(summary: &RaidSummary) -> String {
    let mut out = format!(
        "🏁 Raid complete! {}\nRaiders: {} | Verified actions: {} of {} claims | Ran {} min.",
        summary.target,
        summary.participant_count,
        summary.total_verified_actions,
        summary.total_attempts,
        summary.duration_minutes
    );
    if !summary.top_performers.is_empty() {
        out.push_str("\nTop performers:");
        for (i, top) in summary.top_performers.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {} - {} pts ({} verified)",
                i + 1,
                top.display_name,
                top.points,
                top.verified_actions
            ));
        }
    }
    out
}

pub fn cancelled(target: &str) -> String {
    format!("Raid on {target} was called off.")
}

pub fn standings(standings: &Standings) -> String {
    if standings.is_empty() {
        return format!(
            "No raid history for the {} window yet. Run one with !raid <target-url>!",
            standings.window
        );
    }
    let mut out = format!("🏆 Standings ({})", standings.window);
    for entry in &standings.entries {
        out.push_str(&format!(
            "\n{}. {} - {} pts, {} verified [{}]",
            entry.rank,
            entry.display_name,
            entry.points,
            entry.verified_actions,
            entry.title
        ));
    }
    out
}

/// Canned reply for conversational messages that carried no command.
/// Raid-coordination chatter is handled by the dispatcher, which has the
/// live progress to show.
pub fn intent_reply(intent: Intent) -> &'static str {
    match intent {
        Intent::GeneralConversation => {
            "I'm all about raids. !help shows what I can do."
        }
        Intent::RaidCoordination => {
            "No raid running right now. Fire one up: !raid <target-url>."
        }
        Intent::MarketDiscussion => {
            "Charts go up, charts go down. Raids only go up. !raid <target-url> to prove it."
        }
        Intent::MemeCasual => "gm gm 🔥 keep that energy, the next raid needs it.",
        Intent::SupportRequest => {
            "Try !help for the command list. If something looks broken, flag it to the crew admins."
        }
        Intent::EmergencySafety => {
            "If an account or wallet may be compromised: stop, revoke active sessions and API keys, and contact the platform's official support directly. Never share seed phrases or keys here."
        }
    }
}

pub fn session_expiring(minutes_left: i64) -> String {
    format!(
        "Heads up: this session goes quiet in about {} min. Any message keeps it alive.",
        minutes_left.max(0)
    )
}

pub fn capacity() -> &'static str {
    "I'm at capacity right now. Give it a minute and try again."
}

pub fn internal_error() -> &'static str {
    "Something went wrong on my side. Try that again in a moment."
}

pub fn unknown_command() -> &'static str {
    "I don't know that command. !help lists the ones I do."
}
