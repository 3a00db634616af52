// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the collaborators the job engine depends on.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility so
//! the scheduler and services can hold them as `Arc<dyn ...>`.

pub mod directory;
pub mod dispatch;
pub mod pipeline;
pub mod store;

pub use directory::ClosedGroupDirectory;
pub use dispatch::OnionDispatcher;
pub use pipeline::{AttachmentStore, MessageProcessor};
pub use store::{JobStore, PushStateStore};
