// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push registration state operations (single-row table).

use hush_core::{HushError, PushRegistrationState};
use rusqlite::params;

use crate::database::Database;

/// Read the device's registration state.
pub async fn registration_state(db: &Database) -> Result<PushRegistrationState, HushError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT token, last_upload_ms, enabled FROM push_state WHERE id = 0",
                [],
                |row| {
                    Ok(PushRegistrationState {
                        token: row.get(0)?,
                        last_upload_ms: row.get(1)?,
                        enabled: row.get::<_, i64>(2)? != 0,
                    })
                },
            )
            .map_err(Into::into)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a successful token upload: token, timestamp, and enabled flag
/// in one write.
pub async fn record_registration(
    db: &Database,
    token: &str,
    uploaded_at_ms: i64,
) -> Result<(), HushError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE push_state SET token = ?1, last_upload_ms = ?2, enabled = 1 WHERE id = 0",
                params![token, uploaded_at_ms],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Flip the push-enabled flag without touching the stored token.
pub async fn set_push_enabled(db: &Database, enabled: bool) -> Result<(), HushError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE push_state SET enabled = ?1 WHERE id = 0",
                params![enabled as i64],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
