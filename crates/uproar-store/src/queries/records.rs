// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engagement record CRUD operations.

use rusqlite::params;
use uproar_core::UproarError;

use crate::database::Database;
use crate::models::EngagementRecord;

/// Insert or update the row for `(campaign_id, user_id)`.
///
/// On conflict the row id and `joined_at` keep their original values; every
/// other column takes the incoming record's value. The atomic upsert is what
/// lets the coordinator retry a write after a transient failure without ever
/// producing a duplicate participant row.
pub async fn upsert_record(db: &Database, record: &EngagementRecord) -> Result<(), UproarError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO engagement_records
                     (id, campaign_id, conversation_id, user_id, display_name, points,
                      verified_actions, joined_at, first_verified_at, campaign_status, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT (campaign_id, user_id) DO UPDATE SET
                     conversation_id = excluded.conversation_id,
                     display_name = excluded.display_name,
                     points = excluded.points,
                     verified_actions = excluded.verified_actions,
                     first_verified_at = excluded.first_verified_at,
                     campaign_status = excluded.campaign_status,
                     recorded_at = excluded.recorded_at",
                params![
                    record.id,
                    record.campaign_id,
                    record.conversation_id,
                    record.user_id,
                    record.display_name,
                    record.points,
                    record.verified_actions,
                    record.joined_at,
                    record.first_verified_at,
                    record.campaign_status,
                    record.recorded_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the row for one participant in one campaign.
pub async fn get_record(
    db: &Database,
    campaign_id: &str,
    user_id: &str,
) -> Result<Option<EngagementRecord>, UproarError> {
    let campaign_id = campaign_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, campaign_id, conversation_id, user_id, display_name, points,
                        verified_actions, joined_at, first_verified_at, campaign_status, recorded_at
                 FROM engagement_records WHERE campaign_id = ?1 AND user_id = ?2",
            )?;
            let result = stmt.query_row(params![campaign_id, user_id], |row| {
                Ok(EngagementRecord {
                    id: row.get(0)?,
                    campaign_id: row.get(1)?,
                    conversation_id: row.get(2)?,
                    user_id: row.get(3)?,
                    display_name: row.get(4)?,
                    points: row.get(5)?,
                    verified_actions: row.get(6)?,
                    joined_at: row.get(7)?,
                    first_verified_at: row.get(8)?,
                    campaign_status: row.get(9)?,
                    recorded_at: row.get(10)?,
                })
            });
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List records, optionally restricted to `recorded_at >= cutoff`.
///
/// `cutoff` is an RFC 3339 timestamp; the comparison is the plain string
/// ordering, which matches chronological order for that format.
pub async fn records_since(
    db: &Database,
    cutoff: Option<&str>,
) -> Result<Vec<EngagementRecord>, UproarError> {
    let cutoff = cutoff.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut records = Vec::new();
            match &cutoff {
                Some(cutoff) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, campaign_id, conversation_id, user_id, display_name, points,
                                verified_actions, joined_at, first_verified_at, campaign_status,
                                recorded_at
                         FROM engagement_records WHERE recorded_at >= ?1
                         ORDER BY recorded_at DESC",
                    )?;
                    let rows = stmt.query_map(params![cutoff], |row| {
                        Ok(EngagementRecord {
                            id: row.get(0)?,
                            campaign_id: row.get(1)?,
                            conversation_id: row.get(2)?,
                            user_id: row.get(3)?,
                            display_name: row.get(4)?,
                            points: row.get(5)?,
                            verified_actions: row.get(6)?,
                            joined_at: row.get(7)?,
                            first_verified_at: row.get(8)?,
                            campaign_status: row.get(9)?,
                            recorded_at: row.get(10)?,
                        })
                    })?;
                    for row in rows {
                        records.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, campaign_id, conversation_id, user_id, display_name, points,
                                verified_actions, joined_at, first_verified_at, campaign_status,
                                recorded_at
                         FROM engagement_records ORDER BY recorded_at DESC",
                    )?;
                    let rows = stmt.query_map([], |row| {
                        Ok(EngagementRecord {
                            id: row.get(0)?,
                            campaign_id: row.get(1)?,
                            conversation_id: row.get(2)?,
                            user_id: row.get(3)?,
                            display_name: row.get(4)?,
                            points: row.get(5)?,
                            verified_actions: row.get(6)?,
                            joined_at: row.get(7)?,
                            first_verified_at: row.get(8)?,
                            campaign_status: row.get(9)?,
                            recorded_at: row.get(10)?,
                        })
                    })?;
                    for row in rows {
                        records.push(row?);
                    }
                }
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All rows for one campaign, oldest joiner first.
pub async fn records_for_campaign(
    db: &Database,
    campaign_id: &str,
) -> Result<Vec<EngagementRecord>, UproarError> {
    let campaign_id = campaign_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, campaign_id, conversation_id, user_id, display_name, points,
                        verified_actions, joined_at, first_verified_at, campaign_status, recorded_at
                 FROM engagement_records WHERE campaign_id = ?1
                 ORDER BY joined_at ASC",
            )?;
            let rows = stmt.query_map(params![campaign_id], |row| {
                Ok(EngagementRecord {
                    id: row.get(0)?,
                    campaign_id: row.get(1)?,
                    conversation_id: row.get(2)?,
                    user_id: row.get(3)?,
                    display_name: row.get(4)?,
                    points: row.get(5)?,
                    verified_actions: row.get(6)?,
                    joined_at: row.get(7)?,
                    first_verified_at: row.get(8)?,
                    campaign_status: row.get(9)?,
                    recorded_at: row.get(10)?,
                })
            })?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
