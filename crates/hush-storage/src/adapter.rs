// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait implementations binding the SQLite layer to the `hush-core`
//! store seams.

use async_trait::async_trait;
use hush_core::{HushError, JobId, JobRecord, JobStore, PushRegistrationState, PushStateStore};

use crate::database::Database;
use crate::queries;

/// [`JobStore`] backed by the shared SQLite connection.
#[derive(Debug, Clone)]
pub struct SqliteJobStore {
    db: Database,
}

impl SqliteJobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn persist(&self, record: &JobRecord) -> Result<(), HushError> {
        queries::jobs::persist(&self.db, record).await
    }

    async fn mark_succeeded(&self, id: &JobId) -> Result<(), HushError> {
        queries::jobs::mark_succeeded(&self.db, id).await
    }

    async fn mark_failed(&self, id: &JobId) -> Result<(), HushError> {
        queries::jobs::mark_failed(&self.db, id).await
    }

    async fn is_canceled(&self, id: &JobId) -> Result<bool, HushError> {
        queries::jobs::is_canceled(&self.db, id).await
    }

    async fn cancel(&self, id: &JobId) -> Result<(), HushError> {
        queries::jobs::cancel(&self.db, id).await
    }

    async fn all_pending_of_type(&self, type_key: &str) -> Result<Vec<JobRecord>, HushError> {
        queries::jobs::all_pending_of_type(&self.db, type_key).await
    }
}

/// [`PushStateStore`] backed by the shared SQLite connection.
#[derive(Debug, Clone)]
pub struct SqlitePushStateStore {
    db: Database,
}

impl SqlitePushStateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PushStateStore for SqlitePushStateStore {
    async fn registration_state(&self) -> Result<PushRegistrationState, HushError> {
        queries::push_state::registration_state(&self.db).await
    }

    async fn record_registration(
        &self,
        token: &str,
        uploaded_at_ms: i64,
    ) -> Result<(), HushError> {
        queries::push_state::record_registration(&self.db, token, uploaded_at_ms).await
    }

    async fn set_push_enabled(&self, enabled: bool) -> Result<(), HushError> {
        queries::push_state::set_push_enabled(&self.db, enabled).await
    }
}
