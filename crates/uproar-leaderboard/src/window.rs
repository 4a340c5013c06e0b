// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling time windows for standings queries.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use strum::{Display, EnumString};

/// The slice of history a standings query covers, rolling back from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum StandingsWindow {
    Daily,
    Weekly,
    Monthly,
    #[default]
    All,
}

impl StandingsWindow {
    /// Inclusive lower bound on `recorded_at` for this window, as an
    /// RFC 3339 timestamp, or `None` for all-time.
    ///
    /// Millisecond precision with a trailing `Z` matches the format the
    /// store writes, so the bound compares correctly as a plain string.
    pub fn cutoff_from(self, now: DateTime<Utc>) -> Option<String> {
        let span = match self {
            StandingsWindow::Daily => Duration::days(1),
            StandingsWindow::Weekly => Duration::days(7),
            StandingsWindow::Monthly => Duration::days(30),
            StandingsWindow::All => return None,
        };
        Some((now - span).to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
