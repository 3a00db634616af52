// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent job execution for the Hush client.
//!
//! A [`JobQueue`] persists every job before running it, retries transient
//! failures with capped exponential backoff, and resumes pending jobs
//! after a restart. The job variants themselves live in [`variants`]; each
//! one reports a [`JobOutcome`] per attempt and the scheduler owns all
//! bookkeeping around it.

mod context;
mod job;
mod queue;
mod variants;

pub use context::JobContext;
pub use job::{Job, JobKind, JobOutcome};
pub use queue::{JobQueue, retry_interval};
pub use variants::{
    AttachmentDownloadJob, AttachmentUploadJob, MessageReceiveJob, MessageSendJob,
    NotifyPnServerJob,
};
