// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job record operations for crash-safe scheduling.

use std::str::FromStr;

use hush_core::{HushError, JobId, JobRecord, JobStatus};
use rusqlite::params;

use crate::database::Database;

/// Insert the record, or overwrite payload/failure count/status for an
/// existing id. The canceled flag is never reset by a re-persist.
pub async fn persist(db: &Database, record: &JobRecord) -> Result<(), HushError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO jobs (id, type_key, payload, failure_count, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     payload = excluded.payload,
                     failure_count = excluded.failure_count,
                     status = excluded.status,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    record.id.0,
                    record.type_key,
                    record.payload,
                    record.failure_count,
                    record.status.to_string(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark the job succeeded. Only a pending job transitions; calling this
/// twice, or on an already terminal job, is a no-op.
pub async fn mark_succeeded(db: &Database, id: &JobId) -> Result<(), HushError> {
    set_terminal_status(db, id, JobStatus::Succeeded).await
}

/// Mark the job failed (terminal). Idempotent like [`mark_succeeded`].
pub async fn mark_failed(db: &Database, id: &JobId) -> Result<(), HushError> {
    set_terminal_status(db, id, JobStatus::Failed).await
}

async fn set_terminal_status(db: &Database, id: &JobId, status: JobStatus) -> Result<(), HushError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE jobs SET status = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2 AND status = 'pending'",
                params![status.to_string(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the canceled flag. The scheduler consults it before scheduling any
/// retry; a canceled job is abandoned the next time it fails.
pub async fn cancel(db: &Database, id: &JobId) -> Result<(), HushError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE jobs SET canceled = 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether the job is flagged canceled. An unknown id reads as false.
pub async fn is_canceled(db: &Database, id: &JobId) -> Result<bool, HushError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let canceled = conn
                .query_row(
                    "SELECT canceled FROM jobs WHERE id = ?1",
                    params![id],
                    |row| row.get::<_, i64>(0),
                )
                .map(|v| v != 0);
            match canceled {
                Ok(v) => Ok(v),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All pending (non-terminal, non-canceled) jobs of one type, in ascending
/// id order. Ids are epoch-millisecond strings, so numeric ordering gives
/// enqueue-time order regardless of string length.
pub async fn all_pending_of_type(
    db: &Database,
    type_key: &str,
) -> Result<Vec<JobRecord>, HushError> {
    let type_key = type_key.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, type_key, payload, failure_count, status
                 FROM jobs
                 WHERE type_key = ?1 AND status = 'pending' AND canceled = 0
                 ORDER BY CAST(id AS INTEGER) ASC",
            )?;
            let rows = stmt.query_map(params![type_key], |row| {
                let status: String = row.get(4)?;
                let status = JobStatus::from_str(&status).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(JobRecord {
                    id: JobId(row.get(0)?),
                    type_key: row.get(1)?,
                    payload: row.get(2)?,
                    failure_count: row.get(3)?,
                    status,
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
