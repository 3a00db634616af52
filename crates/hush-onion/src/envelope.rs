// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope sealing seam.
//!
//! The actual onion cryptography (layered encryption toward the hop path
//! and the destination's long-lived key) lives outside this core. The
//! dispatch client only needs something that turns an [`OnionRequest`]
//! into the JSON envelope the relay path accepts.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hush_core::{HushError, OnionRequest};
use serde_json::json;

/// Seals an outbound request into the relay envelope.
pub trait EnvelopeSealer: Send + Sync {
    fn seal(&self, request: &OnionRequest) -> Result<serde_json::Value, HushError>;
}

/// Pass-through sealer: wraps the inner request unencrypted, base64-encoded.
///
/// Used in tests and by embedders that layer their own sealing around the
/// client. The envelope shape matches what a real sealer produces, minus
/// the encryption.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextSealer;

impl EnvelopeSealer for PlaintextSealer {
    fn seal(&self, request: &OnionRequest) -> Result<serde_json::Value, HushError> {
        let inner = json!({
            "method": "POST",
            "endpoint": request.endpoint,
            "body": request.body.to_string(),
        });
        Ok(json!({
            "destination": request.destination.base_url,
            "destination_key": request.destination.public_key,
            "payload": STANDARD.encode(inner.to_string()),
        }))
    }
}
