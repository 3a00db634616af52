// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque message and attachment collaborators the job variants call into.
//!
//! Cryptographic key management and envelope decryption are explicitly
//! outside this core; these traits are the seam to whatever provides them.

use async_trait::async_trait;

use crate::error::HushError;

/// Decrypts and applies an inbound message envelope.
///
/// A structurally invalid envelope must surface as
/// [`HushError::Malformed`](crate::error::HushError::Malformed) so the
/// receive job can classify it as a permanent failure instead of burning
/// its retry budget.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    async fn process_envelope(&self, envelope: &[u8]) -> Result<(), HushError>;
}

/// Local attachment persistence the transfer jobs read from and write to.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Stores downloaded ciphertext for the given attachment.
    async fn store_ciphertext(&self, attachment_id: &str, bytes: Vec<u8>) -> Result<(), HushError>;

    /// Loads the bytes to upload for the given attachment.
    async fn load_upload_bytes(&self, attachment_id: &str) -> Result<Vec<u8>, HushError>;

    /// Records the file-server id assigned to a completed upload.
    async fn record_upload(&self, attachment_id: &str, file_id: &str) -> Result<(), HushError>;
}
