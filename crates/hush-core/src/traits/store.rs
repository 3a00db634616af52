// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store traits: the job store and the push registration
//! preference store.
//!
//! The store's own persistence layer is responsible for serializing
//! concurrent writes; callers may invoke these from many tasks at once.

use async_trait::async_trait;

use crate::error::HushError;
use crate::types::{JobId, JobRecord, PushRegistrationState};

/// Persists and retrieves job records and tracks cancellation and
/// completion state. The single source of truth the scheduler recovers
/// from after a restart.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts the record, or overwrites the record with the same id.
    ///
    /// Called once at enqueue time and again after every failed attempt
    /// to persist the updated failure count.
    async fn persist(&self, record: &JobRecord) -> Result<(), HushError>;

    /// Marks the job succeeded. Idempotent: a second call on an already
    /// terminal record is a no-op.
    async fn mark_succeeded(&self, id: &JobId) -> Result<(), HushError>;

    /// Marks the job failed (terminal). Idempotent.
    async fn mark_failed(&self, id: &JobId) -> Result<(), HushError>;

    /// Whether the job has been canceled. Consulted by the scheduler
    /// before any retry is scheduled.
    async fn is_canceled(&self, id: &JobId) -> Result<bool, HushError>;

    /// Sets the canceled flag. A canceled job is silently abandoned the
    /// next time it fails.
    async fn cancel(&self, id: &JobId) -> Result<(), HushError>;

    /// All not-yet-terminal jobs with the given type key, ordered by
    /// ascending id (enqueue-time order).
    async fn all_pending_of_type(&self, type_key: &str) -> Result<Vec<JobRecord>, HushError>;
}

/// Per-device push registration state, read and written by the push
/// registration service to avoid redundant uploads.
#[async_trait]
pub trait PushStateStore: Send + Sync {
    /// The current registration state.
    async fn registration_state(&self) -> Result<PushRegistrationState, HushError>;

    /// Records a successful token upload: token, upload timestamp, and
    /// the enabled flag all at once.
    async fn record_registration(&self, token: &str, uploaded_at_ms: i64)
    -> Result<(), HushError>;

    /// Flips the push-enabled flag without touching the token.
    async fn set_push_enabled(&self, enabled: bool) -> Result<(), HushError>;
}
