// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The known job variants and their execution logic.
//!
//! Each variant owns a serializable payload and a `run` method producing
//! exactly one [`JobOutcome`] per attempt — terminal reporting is a return
//! value, never a callback, so an attempt cannot report zero or several
//! outcomes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hush_core::{HushError, OnionRequest, ServerTarget};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::context::JobContext;
use crate::job::JobOutcome;

/// Delivers a sealed outbound message to the recipient's swarm entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSendJob {
    /// Recipient public key.
    pub recipient: String,
    /// Sealed message ciphertext, base64-encoded.
    pub data: String,
    /// Message time-to-live on the swarm, in milliseconds.
    pub ttl_ms: u64,
    /// The swarm entry node storing messages for the recipient.
    pub swarm: ServerTarget,
}

impl MessageSendJob {
    pub const KEY: &'static str = "MessageSendJob";

    pub(crate) async fn run(&self, ctx: &JobContext) -> JobOutcome {
        let body = json!({
            "pubKey": self.recipient,
            "data": self.data,
            "ttl": self.ttl_ms,
        });
        let request = OnionRequest::new(self.swarm.clone(), "/store", body);
        match ctx.dispatcher.send_onion_request(request).await {
            Ok(response) if response.is_success() => JobOutcome::Success,
            Ok(response) => {
                let code = response.code.unwrap_or(-1);
                warn!(code, "swarm rejected message store");
                JobOutcome::Retry(HushError::Rejected {
                    code,
                    message: response.message.unwrap_or_else(|| "null".into()),
                })
            }
            Err(e) => JobOutcome::Retry(e),
        }
    }
}

/// Processes one inbound message envelope through the opaque decryption
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceiveJob {
    /// The raw envelope, base64-encoded.
    pub data: String,
}

impl MessageReceiveJob {
    pub const KEY: &'static str = "MessageReceiveJob";

    pub(crate) async fn run(&self, ctx: &JobContext) -> JobOutcome {
        // An envelope that is not even valid base64 will never process;
        // skip the retry ladder entirely.
        let envelope = match STANDARD.decode(&self.data) {
            Ok(bytes) => bytes,
            Err(e) => {
                return JobOutcome::Permanent(HushError::Malformed(format!(
                    "envelope is not valid base64: {e}"
                )));
            }
        };
        match ctx.processor.process_envelope(&envelope).await {
            Ok(()) => JobOutcome::Success,
            Err(e @ HushError::Malformed(_)) => JobOutcome::Permanent(e),
            Err(e) => JobOutcome::Retry(e),
        }
    }
}

/// Fetches an attachment's ciphertext from the file server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDownloadJob {
    pub attachment_id: String,
    /// The message the attachment belongs to.
    pub message_id: i64,
}

impl AttachmentDownloadJob {
    pub const KEY: &'static str = "AttachmentDownloadJob";

    pub(crate) async fn run(&self, ctx: &JobContext) -> JobOutcome {
        let body = json!({ "id": self.attachment_id });
        let request = OnionRequest::new(ctx.file_server.clone(), "/files", body);
        let response = match ctx.dispatcher.send_onion_request(request).await {
            Ok(r) => r,
            Err(e) => return JobOutcome::Retry(e),
        };
        if !response.is_success() {
            let code = response.code.unwrap_or(-1);
            debug!(attachment_id = %self.attachment_id, code, "file server rejected download");
            return JobOutcome::Retry(HushError::Rejected {
                code,
                message: response.message.unwrap_or_else(|| "null".into()),
            });
        }

        let Some(data) = response.body.get("data").and_then(|v| v.as_str()) else {
            return JobOutcome::Retry(HushError::Dispatch {
                message: "file server response is missing attachment data".into(),
                source: None,
            });
        };
        // A present-but-undecodable ciphertext will never improve with
        // retries.
        let bytes = match STANDARD.decode(data) {
            Ok(bytes) => bytes,
            Err(e) => {
                return JobOutcome::Permanent(HushError::Malformed(format!(
                    "attachment ciphertext is not valid base64: {e}"
                )));
            }
        };
        match ctx.attachments.store_ciphertext(&self.attachment_id, bytes).await {
            Ok(()) => JobOutcome::Success,
            Err(e) => JobOutcome::Retry(e),
        }
    }
}

/// Uploads an attachment's bytes to the file server and records the
/// assigned file id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentUploadJob {
    pub attachment_id: String,
}

impl AttachmentUploadJob {
    pub const KEY: &'static str = "AttachmentUploadJob";

    pub(crate) async fn run(&self, ctx: &JobContext) -> JobOutcome {
        // If the local attachment row is gone, no amount of retrying will
        // bring it back.
        let bytes = match ctx.attachments.load_upload_bytes(&self.attachment_id).await {
            Ok(bytes) => bytes,
            Err(e) => return JobOutcome::Permanent(e),
        };

        let body = json!({ "file": STANDARD.encode(&bytes) });
        let request = OnionRequest::new(ctx.file_server.clone(), "/files", body);
        let response = match ctx.dispatcher.send_onion_request(request).await {
            Ok(r) => r,
            Err(e) => return JobOutcome::Retry(e),
        };
        if !response.is_success() {
            let code = response.code.unwrap_or(-1);
            debug!(attachment_id = %self.attachment_id, code, "file server rejected upload");
            return JobOutcome::Retry(HushError::Rejected {
                code,
                message: response.message.unwrap_or_else(|| "null".into()),
            });
        }

        let file_id = response
            .body
            .get("id")
            .and_then(|v| v.as_str().map(str::to_owned).or_else(|| v.as_i64().map(|n| n.to_string())));
        let Some(file_id) = file_id else {
            return JobOutcome::Retry(HushError::Dispatch {
                message: "file server response is missing the file id".into(),
                source: None,
            });
        };
        match ctx.attachments.record_upload(&self.attachment_id, &file_id).await {
            Ok(()) => JobOutcome::Success,
            Err(e) => JobOutcome::Retry(e),
        }
    }
}

/// Tells the push-relay server about a freshly stored message so it can
/// wake the recipient's device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyPnServerJob {
    /// Sealed message ciphertext, base64-encoded.
    pub data: String,
    /// Recipient public key.
    pub send_to: String,
}

impl NotifyPnServerJob {
    pub const KEY: &'static str = "NotifyPNServerJob";

    pub(crate) async fn run(&self, ctx: &JobContext) -> JobOutcome {
        let body = json!({ "data": self.data, "send_to": self.send_to });
        let request = OnionRequest::new(ctx.push_server.clone(), "/notify", body);
        match ctx.dispatcher.send_onion_request(request).await {
            Ok(response) if response.is_success() => JobOutcome::Success,
            Ok(response) => {
                let code = response.code.unwrap_or(-1);
                debug!(
                    code,
                    message = response.message.as_deref().unwrap_or("null"),
                    "couldn't notify PN server"
                );
                JobOutcome::Retry(HushError::Rejected {
                    code,
                    message: response.message.unwrap_or_else(|| "null".into()),
                })
            }
            Err(e) => JobOutcome::Retry(e),
        }
    }
}
