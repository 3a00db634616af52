// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory collaborator implementations for Hush workspace tests.
//!
//! These mirror the semantics the real implementations guarantee (idempotent
//! terminal marks, enqueue-ordered pending scans, single-writer visibility)
//! while recording enough call history for tests to assert against.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use hush_core::{
    AttachmentStore, ClosedGroupDirectory, HushError, JobId, JobRecord, JobStatus, JobStore,
    MessageProcessor, OnionDispatcher, OnionRequest, OnionResponse, PushRegistrationState,
    PushStateStore,
};

/// In-memory [`JobStore`] with call-history recording.
#[derive(Default)]
pub struct MemoryJobStore {
    records: Mutex<HashMap<String, JobRecord>>,
    canceled: Mutex<HashSet<String>>,
    /// Every `persist` call as `(id, failure_count)`, in order.
    persist_log: Mutex<Vec<(String, u32)>>,
    scan_count: AtomicUsize,
    /// Type keys whose pending scans fail with a storage error.
    failing_scans: Mutex<HashSet<String>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing the persist log (for seeding
    /// pre-restart state in resume tests).
    pub async fn seed(&self, record: JobRecord) {
        self.records.lock().await.insert(record.id.0.clone(), record);
    }

    /// The stored status of a job, if the id is known.
    pub async fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.records.lock().await.get(&id.0).map(|r| r.status)
    }

    /// The stored failure count of a job, if the id is known.
    pub async fn failure_count(&self, id: &JobId) -> Option<u32> {
        self.records.lock().await.get(&id.0).map(|r| r.failure_count)
    }

    /// Every persist call so far, as `(id, failure_count)`.
    pub async fn persist_log(&self) -> Vec<(String, u32)> {
        self.persist_log.lock().await.clone()
    }

    /// How many times `all_pending_of_type` has been called (any type).
    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::SeqCst)
    }

    /// Make every pending scan for this type key fail with a storage error.
    pub async fn fail_scans_of(&self, type_key: &str) {
        self.failing_scans.lock().await.insert(type_key.to_string());
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn persist(&self, record: &JobRecord) -> Result<(), HushError> {
        self.persist_log
            .lock()
            .await
            .push((record.id.0.clone(), record.failure_count));
        let mut records = self.records.lock().await;
        // A re-persist never resets an already canceled/terminal status
        // mark; the scheduler only re-persists pending jobs.
        records.insert(record.id.0.clone(), record.clone());
        Ok(())
    }

    async fn mark_succeeded(&self, id: &JobId) -> Result<(), HushError> {
        let mut records = self.records.lock().await;
        if let Some(r) = records.get_mut(&id.0) {
            if r.status == JobStatus::Pending {
                r.status = JobStatus::Succeeded;
            }
        }
        Ok(())
    }

    async fn mark_failed(&self, id: &JobId) -> Result<(), HushError> {
        let mut records = self.records.lock().await;
        if let Some(r) = records.get_mut(&id.0) {
            if r.status == JobStatus::Pending {
                r.status = JobStatus::Failed;
            }
        }
        Ok(())
    }

    async fn is_canceled(&self, id: &JobId) -> Result<bool, HushError> {
        Ok(self.canceled.lock().await.contains(&id.0))
    }

    async fn cancel(&self, id: &JobId) -> Result<(), HushError> {
        self.canceled.lock().await.insert(id.0.clone());
        Ok(())
    }

    async fn all_pending_of_type(&self, type_key: &str) -> Result<Vec<JobRecord>, HushError> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);
        if self.failing_scans.lock().await.contains(type_key) {
            return Err(HushError::Internal(format!(
                "scan failed for type {type_key}"
            )));
        }
        let canceled = self.canceled.lock().await;
        let records = self.records.lock().await;
        let mut pending: Vec<JobRecord> = records
            .values()
            .filter(|r| {
                r.type_key == type_key
                    && r.status == JobStatus::Pending
                    && !canceled.contains(&r.id.0)
            })
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.id.0.parse::<u64>().unwrap_or(u64::MAX));
        Ok(pending)
    }
}

/// In-memory [`PushStateStore`].
#[derive(Default)]
pub struct MemoryPushStateStore {
    state: Mutex<PushRegistrationState>,
}

impl MemoryPushStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole state (for seeding freshness-window tests).
    pub async fn set_state(&self, state: PushRegistrationState) {
        *self.state.lock().await = state;
    }
}

#[async_trait]
impl PushStateStore for MemoryPushStateStore {
    async fn registration_state(&self) -> Result<PushRegistrationState, HushError> {
        Ok(self.state.lock().await.clone())
    }

    async fn record_registration(
        &self,
        token: &str,
        uploaded_at_ms: i64,
    ) -> Result<(), HushError> {
        let mut state = self.state.lock().await;
        state.token = Some(token.to_string());
        state.last_upload_ms = Some(uploaded_at_ms);
        state.enabled = true;
        Ok(())
    }

    async fn set_push_enabled(&self, enabled: bool) -> Result<(), HushError> {
        self.state.lock().await.enabled = enabled;
        Ok(())
    }
}

/// Fixed-content [`ClosedGroupDirectory`].
pub struct MemoryDirectory {
    groups: Vec<String>,
    user_key: Option<String>,
}

impl MemoryDirectory {
    pub fn new(groups: Vec<String>, user_key: Option<String>) -> Self {
        Self { groups, user_key }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }
}

#[async_trait]
impl ClosedGroupDirectory for MemoryDirectory {
    async fn all_closed_group_public_keys(&self) -> Result<Vec<String>, HushError> {
        Ok(self.groups.clone())
    }

    async fn user_public_key(&self) -> Result<Option<String>, HushError> {
        Ok(self.user_key.clone())
    }
}

/// What the [`ScriptedProcessor`] does with every envelope it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorMode {
    /// Process successfully.
    Succeed,
    /// Report the envelope as structurally invalid (permanent condition).
    Malformed,
    /// Fail with a transient error.
    Fail,
}

/// [`MessageProcessor`] with a fixed disposition, recording every envelope
/// it receives.
pub struct ScriptedProcessor {
    mode: ProcessorMode,
    envelopes: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedProcessor {
    pub fn new(mode: ProcessorMode) -> Self {
        Self {
            mode,
            envelopes: Mutex::new(Vec::new()),
        }
    }

    /// Every envelope processed so far, in order.
    pub async fn envelopes(&self) -> Vec<Vec<u8>> {
        self.envelopes.lock().await.clone()
    }
}

#[async_trait]
impl MessageProcessor for ScriptedProcessor {
    async fn process_envelope(&self, envelope: &[u8]) -> Result<(), HushError> {
        self.envelopes.lock().await.push(envelope.to_vec());
        match self.mode {
            ProcessorMode::Succeed => Ok(()),
            ProcessorMode::Malformed => Err(HushError::Malformed("bad envelope".into())),
            ProcessorMode::Fail => Err(HushError::Internal("processor unavailable".into())),
        }
    }
}

/// In-memory [`AttachmentStore`].
#[derive(Default)]
pub struct MemoryAttachmentStore {
    ciphertexts: Mutex<HashMap<String, Vec<u8>>>,
    upload_bytes: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Mutex<HashMap<String, String>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make bytes available for a future upload job.
    pub async fn seed_upload(&self, attachment_id: &str, bytes: Vec<u8>) {
        self.upload_bytes
            .lock()
            .await
            .insert(attachment_id.to_string(), bytes);
    }

    /// Ciphertext stored by a download job, if any.
    pub async fn ciphertext(&self, attachment_id: &str) -> Option<Vec<u8>> {
        self.ciphertexts.lock().await.get(attachment_id).cloned()
    }

    /// File-server id recorded by an upload job, if any.
    pub async fn uploaded_file_id(&self, attachment_id: &str) -> Option<String> {
        self.uploads.lock().await.get(attachment_id).cloned()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn store_ciphertext(&self, attachment_id: &str, bytes: Vec<u8>) -> Result<(), HushError> {
        self.ciphertexts
            .lock()
            .await
            .insert(attachment_id.to_string(), bytes);
        Ok(())
    }

    async fn load_upload_bytes(&self, attachment_id: &str) -> Result<Vec<u8>, HushError> {
        self.upload_bytes
            .lock()
            .await
            .get(attachment_id)
            .cloned()
            .ok_or_else(|| HushError::Internal(format!("no such attachment: {attachment_id}")))
    }

    async fn record_upload(&self, attachment_id: &str, file_id: &str) -> Result<(), HushError> {
        self.uploads
            .lock()
            .await
            .insert(attachment_id.to_string(), file_id.to_string());
        Ok(())
    }
}

/// One scripted reply for the [`ScriptedDispatcher`].
#[derive(Debug, Clone)]
pub enum Scripted {
    /// `Ok` with the given JSON body (code absent or as present in the body).
    Success(serde_json::Value),
    /// `Ok` with a non-zero application-level code.
    Rejection { code: i64, message: String },
    /// `Err(HushError::Dispatch)`, as if the call-level retry budget was
    /// already exhausted inside the dispatch client.
    TransportFailure(String),
}

/// Scriptable [`OnionDispatcher`]: pops one scripted reply per call,
/// defaulting to success once the script is exhausted, and records every
/// request it sees.
#[derive(Default)]
pub struct ScriptedDispatcher {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<OnionRequest>>,
    /// When set, each call acquires one permit before replying, letting a
    /// test hold an in-flight attempt open.
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate every call on a semaphore the test releases explicitly.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub async fn push(&self, reply: Scripted) {
        self.script.lock().await.push_back(reply);
    }

    /// Queue `n` transport failures.
    pub async fn push_transport_failures(&self, n: usize) {
        let mut script = self.script.lock().await;
        for _ in 0..n {
            script.push_back(Scripted::TransportFailure("relay unreachable".into()));
        }
    }

    /// Every request dispatched so far.
    pub async fn requests(&self) -> Vec<OnionRequest> {
        self.requests.lock().await.clone()
    }

    /// How many dispatch calls have been made.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl OnionDispatcher for ScriptedDispatcher {
    async fn send_onion_request(&self, request: OnionRequest) -> Result<OnionResponse, HushError> {
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|e| HushError::Internal(e.to_string()))?;
            permit.forget();
        }
        self.requests.lock().await.push(request);
        let scripted = self.script.lock().await.pop_front();
        match scripted {
            None => Ok(OnionResponse::from_json(serde_json::json!({ "code": 0 }))),
            Some(Scripted::Success(body)) => Ok(OnionResponse::from_json(body)),
            Some(Scripted::Rejection { code, message }) => Ok(OnionResponse::from_json(
                serde_json::json!({ "code": code, "message": message }),
            )),
            Some(Scripted::TransportFailure(message)) => Err(HushError::Dispatch {
                message,
                source: None,
            }),
        }
    }
}
