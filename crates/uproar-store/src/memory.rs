// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of the RecordStore trait.
//!
//! Keeps every row in a `DashMap` keyed by `(campaign_id, user_id)`. Nothing
//! survives a restart; useful for tests and for running the agent without a
//! database file.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use uproar_core::types::EngagementRecord;
use uproar_core::{AdapterType, HealthStatus, PluginAdapter, RecordStore, UproarError};

/// Volatile record store backed by a concurrent hash map.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<(String, String), EngagementRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for MemoryRecordStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, UproarError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), UproarError> {
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn initialize(&self) -> Result<(), UproarError> {
        Ok(())
    }

    async fn upsert_record(&self, record: &EngagementRecord) -> Result<(), UproarError> {
        let key = (record.campaign_id.clone(), record.user_id.clone());
        match self.records.entry(key) {
            Entry::Occupied(mut occupied) => {
                // Same identity rules as the SQLite upsert: row id and join
                // time keep their original values.
                let existing = occupied.get_mut();
                let id = existing.id.clone();
                let joined_at = existing.joined_at.clone();
                *existing = record.clone();
                existing.id = id;
                existing.joined_at = joined_at;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record.clone());
            }
        }
        Ok(())
    }

    async fn records_since(
        &self,
        cutoff: Option<&str>,
    ) -> Result<Vec<EngagementRecord>, UproarError> {
        let mut records: Vec<EngagementRecord> = self
            .records
            .iter()
            .filter(|entry| match cutoff {
                Some(cutoff) => entry.value().recorded_at.as_str() >= cutoff,
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }

    async fn records_for_campaign(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<EngagementRecord>, UproarError> {
        let mut records: Vec<EngagementRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().campaign_id == campaign_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(records)
    }

    async fn close(&self) -> Result<(), UproarError> {
        Ok(())
    }
}
