// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The collaborator bundle job variants execute against.

use std::sync::Arc;

use hush_core::{AttachmentStore, MessageProcessor, OnionDispatcher, ServerTarget};

/// Everything a job variant needs to do its work: the onion dispatch
/// layer, the opaque message/attachment collaborators, and the static
/// destination-server identities.
///
/// Built once by the composition root and shared by every execution.
#[derive(Clone)]
pub struct JobContext {
    pub dispatcher: Arc<dyn OnionDispatcher>,
    pub processor: Arc<dyn MessageProcessor>,
    pub attachments: Arc<dyn AttachmentStore>,
    /// The push-relay notification server.
    pub push_server: ServerTarget,
    /// The attachment file server.
    pub file_server: ServerTarget,
}
