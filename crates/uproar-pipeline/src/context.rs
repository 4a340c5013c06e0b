// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ambient context extraction from admitted messages.
//!
//! Builds the [`ContextBag`] the classifier and reply paths read: parsed
//! text features (a leading `!command`, @mentions, #hashtags, links) plus
//! ambient signals derived from the clock and recent conversation history
//! (time-of-day bucket, weekend flag, sender pattern, sentiment, community
//! mood). Pure function of its inputs, no I/O, never fails; absent
//! features are just empty or neutral.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use regex::Regex;
use serde::Serialize;

/// How many trailing history entries the sender-pattern scan covers.
pub const HISTORY_SCAN_DEPTH: usize = 20;

/// Sender messages within the scan depth needed to count as a regular.
pub const REGULAR_SENDER_MIN: usize = 2;

/// Sender messages within the scan depth needed to count as frequent.
pub const FREQUENT_SENDER_MIN: usize = 5;

/// How many trailing history entries the sentiment and mood scans cover.
pub const SENTIMENT_SCAN_DEPTH: usize = 10;

/// Mean enthusiasm hits per scanned message at which the mood is hyped.
pub const HYPED_DENSITY_MIN: f32 = 0.5;

/// Mean conflict hits per scanned message at which the mood is heated.
pub const HEATED_DENSITY_MIN: f32 = 0.5;

/// Hour (UTC) at which morning begins; night runs until then.
pub const MORNING_FROM_HOUR: u32 = 5;
pub const AFTERNOON_FROM_HOUR: u32 = 12;
pub const EVENING_FROM_HOUR: u32 = 17;
pub const NIGHT_FROM_HOUR: u32 = 22;

/// Positive sentiment lexicon, matched whole-word against normalized text.
const POSITIVE_MARKERS: &[&str] = &[
    "love", "great", "awesome", "amazing", "good", "nice", "win", "excited",
    "congrats", "thanks", "happy",
];

/// Negative sentiment lexicon, matched whole-word against normalized text.
const NEGATIVE_MARKERS: &[&str] = &[
    "hate", "bad", "awful", "terrible", "angry", "sad", "scam", "rug",
    "rekt", "annoyed", "broken",
];

/// Enthusiasm markers whose density drives the hyped mood.
const ENTHUSIASM_MARKERS: &[&str] = &["lfg", "hype", "hyped", "moon", "pump", "lessgo"];

/// Conflict markers whose density drives the heated mood.
const HEATED_MARKERS: &[&str] = &["wtf", "fight", "drama", "beef", "mad", "furious", "angry"];

static MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]{2,32})").unwrap());

static HASHTAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_]{2,64})").unwrap());

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).unwrap());

/// One prior message used for history-derived signals, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub sender_id: String,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
        }
    }
}

/// Coarse time-of-day bucket derived from the message clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeBucket {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// How familiar the sender is, from their share of recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SenderPattern {
    Newcomer,
    Regular,
    Frequent,
}

/// Aggregate sentiment of recent conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Coarse community mood from marker density in recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommunityMood {
    Hyped,
    Steady,
    Heated,
}

/// A leading bang-command, e.g. `!raid https://example.com/post/1 30`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    /// Command name without the `!`, lowercased.
    pub name: String,
    /// Whitespace-separated arguments after the name, verbatim.
    pub args: Vec<String>,
}

/// Everything downstream stages need to know about one message.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBag {
    /// Original text, leading and trailing whitespace trimmed.
    pub text: String,
    /// Lowercased form of `text` for keyword matching.
    pub normalized: String,
    /// Leading bang-command, if the message starts with one.
    pub command: Option<ParsedCommand>,
    /// `@name` mentions in order of appearance.
    pub mentions: Vec<String>,
    /// `#tag` hashtags in order of appearance.
    pub hashtags: Vec<String>,
    /// http(s) links in order of appearance.
    pub links: Vec<String>,
    /// Whitespace-separated word count.
    pub word_count: usize,
    /// Time-of-day bucket at arrival.
    pub time_bucket: TimeBucket,
    /// Whether the message arrived on a Saturday or Sunday.
    pub weekend: bool,
    /// Sender familiarity derived from recent history.
    pub sender_pattern: SenderPattern,
    /// Aggregate sentiment of recent history.
    pub sentiment: Sentiment,
    /// Community mood from marker density in recent history.
    pub mood: CommunityMood,
    /// Whether the conversation has a running raid campaign.
    pub raid_active: bool,
    /// Free-form signals for downstream consumers (reply templating).
    pub extras: HashMap<String, String>,
}

/// Extract the full context bag for one admitted message.
///
/// `history` is the conversation's recent messages, oldest first; the
/// scans only look at the trailing [`HISTORY_SCAN_DEPTH`] /
/// [`SENTIMENT_SCAN_DEPTH`] entries, so callers may pass any amount.
pub fn extract(
    text: &str,
    sender_id: &str,
    history: &[HistoryEntry],
    raid_active: bool,
    now: DateTime<Utc>,
) -> ContextBag {
    let trimmed = text.trim();
    let normalized = trimmed.to_lowercase();

    let command = parse_command(trimmed);

    let mentions = MENTION_PATTERN
        .captures_iter(trimmed)
        .map(|c| c[1].to_string())
        .collect();
    let hashtags = HASHTAG_PATTERN
        .captures_iter(trimmed)
        .map(|c| c[1].to_string())
        .collect();
    let links = LINK_PATTERN
        .find_iter(trimmed)
        .map(|m| m.as_str().to_string())
        .collect();

    ContextBag {
        text: trimmed.to_string(),
        normalized,
        command,
        mentions,
        hashtags,
        links,
        word_count: trimmed.split_whitespace().count(),
        time_bucket: time_bucket(now),
        weekend: matches!(now.weekday(), Weekday::Sat | Weekday::Sun),
        sender_pattern: sender_pattern(sender_id, history),
        sentiment: sentiment(history),
        mood: mood(history),
        raid_active,
        extras: HashMap::new(),
    }
}

fn time_bucket(now: DateTime<Utc>) -> TimeBucket {
    let hour = now.hour();
    if hour < MORNING_FROM_HOUR || hour >= NIGHT_FROM_HOUR {
        TimeBucket::Night
    } else if hour < AFTERNOON_FROM_HOUR {
        TimeBucket::Morning
    } else if hour < EVENING_FROM_HOUR {
        TimeBucket::Afternoon
    } else {
        TimeBucket::Evening
    }
}

fn sender_pattern(sender_id: &str, history: &[HistoryEntry]) -> SenderPattern {
    let scanned = tail(history, HISTORY_SCAN_DEPTH);
    let from_sender = scanned.iter().filter(|e| e.sender_id == sender_id).count();
    if from_sender >= FREQUENT_SENDER_MIN {
        SenderPattern::Frequent
    } else if from_sender >= REGULAR_SENDER_MIN {
        SenderPattern::Regular
    } else {
        SenderPattern::Newcomer
    }
}

fn sentiment(history: &[HistoryEntry]) -> Sentiment {
    let scanned = tail(history, SENTIMENT_SCAN_DEPTH);
    let mut positive = 0usize;
    let mut negative = 0usize;
    for entry in scanned {
        let lower = entry.text.to_lowercase();
        positive += POSITIVE_MARKERS
            .iter()
            .filter(|m| contains_word(&lower, m))
            .count();
        negative += NEGATIVE_MARKERS
            .iter()
            .filter(|m| contains_word(&lower, m))
            .count();
    }
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

fn mood(history: &[HistoryEntry]) -> CommunityMood {
    let scanned = tail(history, SENTIMENT_SCAN_DEPTH);
    if scanned.is_empty() {
        return CommunityMood::Steady;
    }
    let messages = scanned.len() as f32;
    let enthusiasm: usize = scanned.iter().map(|e| enthusiasm_hits(&e.text)).sum();
    if enthusiasm as f32 / messages >= HYPED_DENSITY_MIN {
        return CommunityMood::Hyped;
    }
    let conflict: usize = scanned
        .iter()
        .map(|e| {
            let lower = e.text.to_lowercase();
            HEATED_MARKERS
                .iter()
                .filter(|m| contains_word(&lower, m))
                .count()
        })
        .sum();
    if conflict as f32 / messages >= HEATED_DENSITY_MIN {
        CommunityMood::Heated
    } else {
        CommunityMood::Steady
    }
}

/// Enthusiasm hits in one message: marker words, rocket/fire emoji, and a
/// doubled exclamation run. A single `!` is not counted, so bang-commands
/// do not read as hype.
fn enthusiasm_hits(text: &str) -> usize {
    let lower = text.to_lowercase();
    let mut hits = ENTHUSIASM_MARKERS
        .iter()
        .filter(|m| contains_word(&lower, m))
        .count();
    hits += text.matches('\u{1F680}').count();
    hits += text.matches('\u{1F525}').count();
    if text.contains("!!") {
        hits += 1;
    }
    hits
}

fn tail(history: &[HistoryEntry], depth: usize) -> &[HistoryEntry] {
    &history[history.len().saturating_sub(depth)..]
}

/// Whole-word containment check on normalized text.
pub(crate) fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

/// Parse a leading `!command arg arg...` form, if present.
fn parse_command(trimmed: &str) -> Option<ParsedCommand> {
    let rest = trimmed.strip_prefix('!')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    // A bare "!" or "!?" is punctuation, not a command.
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ParsedCommand {
        name: name.to_lowercase(),
        args: parts.map(|a| a.to_string()).collect(),
    })
}
