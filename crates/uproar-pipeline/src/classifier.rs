// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic intent classification for admitted messages.
//!
//! Maps a [`ContextBag`] to one conversational intent using ordered rule
//! groups, one per intent. Safety patterns are checked before everything
//! else and short-circuit; an active raid forces the raid-coordination
//! intent for any text below that check. No model call, no network, no
//! latency.

use crate::context::{contains_word, ContextBag};

/// Texts longer than this fall through to the low-confidence fallback.
pub const MAX_CLASSIFIABLE_LEN: usize = 2000;

/// Phrases that indicate a member may be reporting live harm.
///
/// Matched against normalized text. Any hit outranks every other rule,
/// including the active-raid override.
const EMERGENCY_PATTERNS: &[&str] = &[
    "hacked",
    "compromised",
    "stolen",
    "scammed",
    "phishing",
    "drained my",
    "urgent help",
    "emergency",
];

/// Raid vocabulary, matched whole-word.
const RAID_WORDS: &[&str] = &["raid", "raiding", "engage", "boost", "amplify", "blast"];

/// Bang-commands that belong to the raid surface.
const RAID_COMMANDS: &[&str] = &["raid", "join", "done", "standings", "leaderboard"];

/// Market vocabulary, matched whole-word.
const MARKET_WORDS: &[&str] = &[
    "price", "chart", "market", "pump", "dump", "dip", "buy", "sell",
    "token", "listing", "airdrop",
];

/// Casual and meme vocabulary, matched whole-word.
const MEME_WORDS: &[&str] = &[
    "lol", "lmao", "haha", "gm", "gn", "wen", "based", "meme", "hi",
    "hello", "hey", "yo", "sup",
];

/// Support vocabulary; phrases use substring match, words whole-word.
const SUPPORT_PHRASES: &[&str] = &[
    "how do i", "how to", "doesn't work", "does not work", "not working",
    "can't", "cannot",
];
const SUPPORT_WORDS: &[&str] = &["help", "error", "issue", "problem", "stuck", "broken"];

/// What a message is about, for routing and reply templating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Default bucket for anything without a stronger signal.
    GeneralConversation,
    /// Raid commands, raid vocabulary, or any text during an active raid.
    RaidCoordination,
    /// Price/trading talk.
    MarketDiscussion,
    /// Greetings, jokes, community banter.
    MemeCasual,
    /// The sender needs help with something that is not working.
    SupportRequest,
    /// Possible live-harm report; handled before anything else.
    EmergencySafety,
}

impl Intent {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::GeneralConversation => "general-conversation",
            Intent::RaidCoordination => "raid-coordination",
            Intent::MarketDiscussion => "market-discussion",
            Intent::MemeCasual => "meme-casual",
            Intent::SupportRequest => "support-request",
            Intent::EmergencySafety => "emergency-safety",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying one message.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// The classified intent.
    pub intent: Intent,
    /// Confidence in the classification (0.0-1.0).
    pub confidence: f32,
    /// Human-readable reason for the classification.
    pub reason: &'static str,
}

/// Heuristic intent classifier with zero cost and zero latency.
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify one extracted context bag.
    ///
    /// Rule groups run in a fixed order: safety, raid, market, meme,
    /// support, fallback. Safety always wins, raid or no raid; the
    /// active-raid override claims everything below it, so during a raid
    /// even neutral text reads as coordination chatter.
    pub fn classify(&self, bag: &ContextBag) -> ClassificationResult {
        if EMERGENCY_PATTERNS
            .iter()
            .any(|p| bag.normalized.contains(p))
        {
            return ClassificationResult {
                intent: Intent::EmergencySafety,
                confidence: 0.95,
                reason: "safety pattern match",
            };
        }

        if let Some(command) = &bag.command {
            if RAID_COMMANDS.contains(&command.name.as_str()) {
                return ClassificationResult {
                    intent: Intent::RaidCoordination,
                    confidence: 1.0,
                    reason: "raid command",
                };
            }
        }

        if bag.raid_active {
            return ClassificationResult {
                intent: Intent::RaidCoordination,
                confidence: 0.8,
                reason: "active raid context",
            };
        }

        if bag.text.is_empty() {
            return ClassificationResult {
                intent: Intent::GeneralConversation,
                confidence: 0.3,
                reason: "empty message",
            };
        }
        if bag.text.chars().count() > MAX_CLASSIFIABLE_LEN {
            return ClassificationResult {
                intent: Intent::GeneralConversation,
                confidence: 0.3,
                reason: "over-long text",
            };
        }

        if RAID_WORDS.iter().any(|w| contains_word(&bag.normalized, w)) {
            return ClassificationResult {
                intent: Intent::RaidCoordination,
                confidence: 0.85,
                reason: "raid vocabulary",
            };
        }

        if MARKET_WORDS
            .iter()
            .any(|w| contains_word(&bag.normalized, w))
        {
            return ClassificationResult {
                intent: Intent::MarketDiscussion,
                confidence: 0.7,
                reason: "market vocabulary",
            };
        }

        if MEME_WORDS.iter().any(|w| contains_word(&bag.normalized, w)) {
            return ClassificationResult {
                intent: Intent::MemeCasual,
                confidence: 0.6,
                reason: "casual marker",
            };
        }

        if SUPPORT_PHRASES.iter().any(|p| bag.normalized.contains(p))
            || SUPPORT_WORDS
                .iter()
                .any(|w| contains_word(&bag.normalized, w))
        {
            return ClassificationResult {
                intent: Intent::SupportRequest,
                confidence: 0.65,
                reason: "support vocabulary",
            };
        }

        ClassificationResult {
            intent: Intent::GeneralConversation,
            confidence: 0.4,
            reason: "no rule group matched",
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::extract;

    fn classify_at(text: &str, raid_active: bool) -> ClassificationResult {
        let now = "2026-03-02T09:30:00Z".parse().expect("valid timestamp");
        IntentClassifier::new().classify(&extract(text, "alice", &[], raid_active, now))
    }

    #[test]
    fn emergency_outranks_everything() {
        let result = classify_at("my account got hacked, !join", true);
        assert_eq!(result.intent, Intent::EmergencySafety);
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn emergency_detected_without_active_raid() {
        let result = classify_at("I think I got scammed, urgent help needed", false);
        assert_eq!(result.intent, Intent::EmergencySafety);
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn active_raid_claims_neutral_text() {
        let result = classify_at("what do you all think of the new logo?", true);
        assert_eq!(result.intent, Intent::RaidCoordination);
        assert!(result.confidence >= 0.8);
        assert_eq!(result.reason, "active raid context");
    }

    #[test]
    fn raid_commands_classify_as_coordination() {
        for text in [
            "!raid https://example.com/post/42 30",
            "!join",
            "!done repost",
            "!standings weekly",
            "!leaderboard",
        ] {
            let result = classify_at(text, false);
            assert_eq!(result.intent, Intent::RaidCoordination, "for {text:?}");
            assert_eq!(result.confidence, 1.0);
        }
    }

    #[test]
    fn raid_vocabulary_matches_without_a_command() {
        let result = classify_at("is the raid still on?", false);
        assert_eq!(result.intent, Intent::RaidCoordination);
        assert_eq!(result.reason, "raid vocabulary");
    }

    #[test]
    fn market_talk_classifies_as_market() {
        let result = classify_at("the chart looks rough, price is dipping", false);
        assert_eq!(result.intent, Intent::MarketDiscussion);
    }

    #[test]
    fn greetings_and_banter_classify_as_meme_casual() {
        for text in ["gm everyone", "lol that was wild", "hey"] {
            let result = classify_at(text, false);
            assert_eq!(result.intent, Intent::MemeCasual, "for {text:?}");
        }
    }

    #[test]
    fn trouble_reports_classify_as_support() {
        for text in [
            "how do i link my account",
            "the bot is stuck again",
            "I can't see my points",
        ] {
            let result = classify_at(text, false);
            assert_eq!(result.intent, Intent::SupportRequest, "for {text:?}");
        }
    }

    #[test]
    fn ordered_groups_let_raid_beat_market() {
        // Both vocabularies present; the raid group runs first.
        let result = classify_at("raid the listing announcement", false);
        assert_eq!(result.intent, Intent::RaidCoordination);
    }

    #[test]
    fn plain_chat_falls_through_to_general() {
        let result = classify_at("what do you all think of the new logo?", false);
        assert_eq!(result.intent, Intent::GeneralConversation);
        assert!(result.confidence < 0.5);
    }

    #[test]
    fn empty_text_is_low_confidence_general() {
        let result = classify_at("", false);
        assert_eq!(result.intent, Intent::GeneralConversation);
        assert_eq!(result.reason, "empty message");
    }

    #[test]
    fn over_long_text_is_low_confidence_general() {
        let long = "a ".repeat(MAX_CLASSIFIABLE_LEN);
        let result = classify_at(&long, false);
        assert_eq!(result.intent, Intent::GeneralConversation);
        assert_eq!(result.reason, "over-long text");
    }

    #[test]
    fn over_long_text_with_a_safety_pattern_still_reads_emergency() {
        let long = format!("{} my wallet got drained my funds", "a ".repeat(MAX_CLASSIFIABLE_LEN));
        let result = classify_at(&long, false);
        assert_eq!(result.intent, Intent::EmergencySafety);
    }

    #[test]
    fn unknown_command_falls_through_to_the_word_groups() {
        let result = classify_at("!dance", false);
        assert_eq!(result.intent, Intent::GeneralConversation);
    }

    #[test]
    fn intent_labels_are_stable() {
        assert_eq!(Intent::EmergencySafety.label(), "emergency-safety");
        assert_eq!(Intent::RaidCoordination.label(), "raid-coordination");
        assert_eq!(Intent::MarketDiscussion.label(), "market-discussion");
        assert_eq!(Intent::MemeCasual.label(), "meme-casual");
        assert_eq!(Intent::SupportRequest.label(), "support-request");
        assert_eq!(
            Intent::GeneralConversation.to_string(),
            "general-conversation"
        );
    }
}
