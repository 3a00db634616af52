// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Hush workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a job.
///
/// Assigned exactly once at enqueue time from a monotonic millisecond
/// generator; stable across every retry of the job so the durable store
/// can locate and update the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable lifecycle state of a job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Persisted but not yet terminal; eligible for resume after a restart.
    Pending,
    /// Finished successfully.
    Succeeded,
    /// Terminal failure (permanent failure or retry budget exhausted).
    Failed,
}

/// The storage-facing shape of a job: type key, encoded payload, and
/// retry bookkeeping. The scheduler converts between this and the typed
/// job union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    /// Stable discriminator identifying which variant decodes the payload.
    pub type_key: String,
    /// Variant-specific payload, encoded as JSON.
    pub payload: String,
    /// Failed attempts so far, including the first.
    pub failure_count: u32,
    pub status: JobStatus,
}

/// A destination server's static identity: base URL plus the long-lived
/// public key used to seal the onion-routed envelope. Configuration
/// values, not negotiated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTarget {
    pub base_url: String,
    pub public_key: String,
}

impl ServerTarget {
    pub fn new(base_url: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            public_key: public_key.into(),
        }
    }
}

/// An outbound call descriptor for the onion dispatch layer.
///
/// Transient; constructed per call and never persisted.
#[derive(Debug, Clone)]
pub struct OnionRequest {
    /// The server the request is ultimately for.
    pub destination: ServerTarget,
    /// Target path on the destination server (e.g. `/register`, `/notify`).
    pub endpoint: String,
    /// JSON request body.
    pub body: serde_json::Value,
}

impl OnionRequest {
    pub fn new(destination: ServerTarget, endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            destination,
            endpoint: endpoint.into(),
            body,
        }
    }
}

/// A parsed reply from an onion-dispatched request.
///
/// Destination servers reply with JSON carrying an optional integer
/// `code`: zero or absent signals success, anything else is an
/// application-level failure the caller must interpret.
#[derive(Debug, Clone)]
pub struct OnionResponse {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub body: serde_json::Value,
}

impl OnionResponse {
    /// Parses the `code`/`message` convention out of a raw JSON reply.
    pub fn from_json(body: serde_json::Value) -> Self {
        let code = body.get("code").and_then(|v| v.as_i64());
        let message = body
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_owned);
        Self { code, message, body }
    }

    /// Zero or absent `code` signals application-level success.
    pub fn is_success(&self) -> bool {
        matches!(self.code, None | Some(0))
    }
}

/// Per-device push registration state, owned by the preference store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRegistrationState {
    /// The device token last uploaded to the push relay, if any.
    pub token: Option<String>,
    /// Epoch milliseconds of the last successful token upload.
    pub last_upload_ms: Option<i64>,
    /// Whether push delivery is currently enabled for this device.
    pub enabled: bool,
}
