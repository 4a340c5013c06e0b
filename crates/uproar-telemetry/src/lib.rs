// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric recording helpers for the Uproar engagement agent.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. With no recorder installed every call is a
//! no-op, so recording can never affect pipeline correctness.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Uproar metric descriptions.
///
/// Called once at startup after a recorder is installed. Harmless to skip
/// when running without one.
pub fn register_metrics() {
    describe_counter!("uproar_messages_admitted_total", "Messages passed by the gate");
    describe_counter!("uproar_messages_refused_total", "Messages refused by the gate");
    describe_counter!("uproar_intents_total", "Classified intents by kind");
    describe_counter!("uproar_sessions_opened_total", "Sessions created");
    describe_counter!("uproar_sessions_closed_total", "Sessions expired or evicted");
    describe_gauge!("uproar_active_sessions", "Currently tracked sessions");
    describe_counter!("uproar_raids_started_total", "Raid campaigns created");
    describe_counter!("uproar_raids_finished_total", "Raid campaigns completed or cancelled");
    describe_gauge!("uproar_active_raids", "Currently active raid campaigns");
    describe_counter!("uproar_raid_joins_total", "Participants joined across raids");
    describe_counter!("uproar_completions_total", "Action completions recorded, by verdict");
    describe_counter!("uproar_outbound_messages_total", "Messages sent through channels");
    describe_counter!("uproar_standings_total", "Leaderboard standings computations, by window");
    describe_counter!("uproar_store_failures_total", "Record store write failures");
    describe_histogram!(
        "uproar_verifier_latency_seconds",
        "External verifier round-trip latency in seconds"
    );
}

/// Record a message admitted by the gate.
pub fn record_admitted(channel: &str) {
    metrics::counter!("uproar_messages_admitted_total", "channel" => channel.to_string())
        .increment(1);
}

/// Record a message refused by the gate.
pub fn record_refused(channel: &str, reason: &str) {
    metrics::counter!(
        "uproar_messages_refused_total",
        "channel" => channel.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a classified intent.
pub fn record_intent(intent: &str) {
    metrics::counter!("uproar_intents_total", "intent" => intent.to_string()).increment(1);
}

/// Record a newly created session.
pub fn record_session_opened() {
    metrics::counter!("uproar_sessions_opened_total").increment(1);
}

/// Record a session leaving the table.
pub fn record_session_closed(reason: &'static str) {
    metrics::counter!("uproar_sessions_closed_total", "reason" => reason).increment(1);
}

/// Set the number of currently tracked sessions.
pub fn set_active_sessions(count: f64) {
    metrics::gauge!("uproar_active_sessions").set(count);
}

/// Record a raid campaign starting.
pub fn record_raid_started() {
    metrics::counter!("uproar_raids_started_total").increment(1);
}

/// Record a raid campaign reaching a terminal state.
pub fn record_raid_finished(outcome: &'static str) {
    metrics::counter!("uproar_raids_finished_total", "outcome" => outcome).increment(1);
}

/// Set the number of currently active raids.
pub fn set_active_raids(count: f64) {
    metrics::gauge!("uproar_active_raids").set(count);
}

/// Record a participant joining a raid.
pub fn record_raid_join() {
    metrics::counter!("uproar_raid_joins_total").increment(1);
}

/// Record an action completion attempt with its verification verdict.
pub fn record_completion(action: &str, verdict: &'static str) {
    metrics::counter!(
        "uproar_completions_total",
        "action" => action.to_string(),
        "verdict" => verdict
    )
    .increment(1);
}

/// Record a message sent through a channel adapter.
pub fn record_outbound(channel: &str) {
    metrics::counter!("uproar_outbound_messages_total", "channel" => channel.to_string())
        .increment(1);
}

/// Record a leaderboard standings computation.
pub fn record_standings(window: &str) {
    metrics::counter!("uproar_standings_total", "window" => window.to_string()).increment(1);
}

/// Record a record store write failure.
pub fn record_store_failure() {
    metrics::counter!("uproar_store_failures_total").increment(1);
}

/// Record external verifier round-trip latency.
pub fn record_verifier_latency(seconds: f64) {
    metrics::histogram!("uproar_verifier_latency_seconds").record(seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    // With no recorder installed the facade drops everything; these calls
    // must still be safe to make from any thread at any time.
    #[test]
    fn recording_without_recorder_is_a_noop() {
        register_metrics();
        record_admitted("console");
        record_refused("console", "rate_limited");
        record_intent("raid_join");
        record_session_opened();
        record_session_closed("expired");
        set_active_sessions(3.0);
        record_raid_started();
        record_raid_finished("completed");
        set_active_raids(1.0);
        record_raid_join();
        record_completion("repost", "verified");
        record_outbound("console");
        record_standings("weekly");
        record_store_failure();
        record_verifier_latency(0.25);
    }
}
