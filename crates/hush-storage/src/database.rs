// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::time::Duration;

use hush_core::HushError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Handle to the single SQLite connection, shared by every query module.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database at `path`, applies PRAGMAs, and runs
    /// all pending migrations.
    pub async fn open(path: &str) -> Result<Self, HushError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(HushError::storage)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(HushError::storage)?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .map_err(HushError::storage)?;
            conn.busy_timeout(Duration::from_secs(5))
                .map_err(HushError::storage)?;
            crate::migrations::run_migrations(conn).map_err(HushError::storage)?;
            Ok(())
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(e) => e,
            e => HushError::storage(e),
        })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection. All access goes through
    /// `connection().call(...)`.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, flushing pending writes.
    pub async fn close(self) -> Result<(), HushError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Maps a tokio-rusqlite error into the workspace storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> HushError {
    HushError::Storage {
        source: Box::new(e),
    }
}
