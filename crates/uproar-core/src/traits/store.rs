// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for persistence backends.

use async_trait::async_trait;

use crate::error::UproarError;
use crate::traits::adapter::PluginAdapter;
use crate::types::EngagementRecord;

/// Adapter for the engagement record store.
///
/// The raid coordinator writes one row per `(campaign, user)` and updates it
/// as verification progresses; the leaderboard reads windowed slices of the
/// same rows. That narrow upsert-plus-window shape is the whole contract, and
/// the engine never assumes anything else about the backing storage.
#[async_trait]
pub trait RecordStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connection setup).
    async fn initialize(&self) -> Result<(), UproarError>;

    /// Inserts or replaces the row for `(record.campaign_id, record.user_id)`.
    async fn upsert_record(&self, record: &EngagementRecord) -> Result<(), UproarError>;

    /// All records with `recorded_at >= cutoff` (RFC 3339), or every record
    /// when `cutoff` is `None`. Ordering is unspecified; aggregation sorts.
    async fn records_since(
        &self,
        cutoff: Option<&str>,
    ) -> Result<Vec<EngagementRecord>, UproarError>;

    /// All records belonging to one campaign.
    async fn records_for_campaign(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<EngagementRecord>, UproarError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), UproarError>;
}
