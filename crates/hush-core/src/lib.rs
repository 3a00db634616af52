// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Hush messenger client.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Hush workspace: the durable job store
//! and push preference seams, the onion dispatch seam, and the opaque
//! message/attachment collaborators the job variants call into.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HushError;
pub use types::{
    JobId, JobRecord, JobStatus, OnionRequest, OnionResponse, PushRegistrationState, ServerTarget,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    AttachmentStore, ClosedGroupDirectory, JobStore, MessageProcessor, OnionDispatcher,
    PushStateStore,
};
