// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Closed-group membership directory.

use async_trait::async_trait;

use crate::error::HushError;

/// Lists the closed groups this device belongs to, and the device's own
/// identity key. Owned by the client's contact/group database; this core
/// only reads it to fan out push subscriptions.
#[async_trait]
pub trait ClosedGroupDirectory: Send + Sync {
    /// Public keys of every closed group this device is a member of.
    async fn all_closed_group_public_keys(&self) -> Result<Vec<String>, HushError>;

    /// This device's own public key, if registered.
    async fn user_public_key(&self) -> Result<Option<String>, HushError>;
}
