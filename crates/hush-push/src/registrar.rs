// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device token registration against the push-relay server.
//!
//! Keeps the relay's record of this device's token and closed-group
//! subscriptions consistent with local state without redundant uploads.
//! Network failures are logged and swallowed at this layer: calls here are
//! fire-and-forget, and durable retry is the job queue's business when
//! these operations are wrapped in a job.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hush_core::{
    ClosedGroupDirectory, HushError, OnionDispatcher, OnionRequest, PushStateStore, ServerTarget,
};
use serde_json::json;
use tracing::{debug, info};

/// Closed-group subscription operations on the push relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedGroupOperation {
    Subscribe,
    Unsubscribe,
}

impl ClosedGroupOperation {
    /// The relay endpoint for this operation.
    pub fn endpoint(self) -> &'static str {
        match self {
            ClosedGroupOperation::Subscribe => "/subscribe_closed_group",
            ClosedGroupOperation::Unsubscribe => "/unsubscribe_closed_group",
        }
    }
}

/// Push registration service.
pub struct PushRegistrar {
    dispatcher: Arc<dyn OnionDispatcher>,
    state: Arc<dyn PushStateStore>,
    directory: Arc<dyn ClosedGroupDirectory>,
    server: ServerTarget,
    /// Freshness window for an uploaded token, in milliseconds (12 h by
    /// default; see `hush-config`).
    token_expiry_ms: i64,
}

impl PushRegistrar {
    pub fn new(
        dispatcher: Arc<dyn OnionDispatcher>,
        state: Arc<dyn PushStateStore>,
        directory: Arc<dyn ClosedGroupDirectory>,
        server: ServerTarget,
        token_expiry_ms: i64,
    ) -> Self {
        Self {
            dispatcher,
            state,
            directory,
            server,
            token_expiry_ms,
        }
    }

    /// Uploads the device token to the relay and re-subscribes every known
    /// closed group.
    ///
    /// When `force` is false, an unchanged token whose last upload is
    /// younger than the freshness window is a no-op. This dedup is what
    /// keeps registration traffic bounded across app-foreground events.
    pub async fn register(
        &self,
        token: &str,
        public_key: &str,
        force: bool,
    ) -> Result<(), HushError> {
        let state = self.state.registration_state().await?;
        let now = now_ms();

        if !force && state.token.as_deref() == Some(token) {
            if let Some(last_upload) = state.last_upload_ms {
                if now.saturating_sub(last_upload) < self.token_expiry_ms {
                    debug!("push token unchanged and fresh; skipping upload");
                    return Ok(());
                }
            }
        }

        let body = json!({ "token": token, "pubKey": public_key });
        match self.dispatch("/register", body).await {
            Ok(()) => {
                self.state.record_registration(token, now).await?;
                info!("registered push token with relay");
            }
            Err(e) => {
                debug!(error = %e, "couldn't register push token");
                return Ok(());
            }
        }

        // Re-subscribe every closed group this device belongs to.
        for group in self.directory.all_closed_group_public_keys().await? {
            self.perform_operation(ClosedGroupOperation::Subscribe, &group, public_key)
                .await?;
        }
        Ok(())
    }

    /// Removes the device token from the relay, unsubscribes every known
    /// closed group, and disables push locally.
    pub async fn unregister(&self, token: &str) -> Result<(), HushError> {
        let body = json!({ "token": token });
        match self.dispatch("/unregister", body).await {
            Ok(()) => {
                // Unsubscribe while the enabled flag still passes the
                // perform_operation guard, then flip it off.
                if let Some(user_key) = self.directory.user_public_key().await? {
                    for group in self.directory.all_closed_group_public_keys().await? {
                        self.perform_operation(
                            ClosedGroupOperation::Unsubscribe,
                            &group,
                            &user_key,
                        )
                        .await?;
                    }
                }
                self.state.set_push_enabled(false).await?;
                info!("unregistered push token from relay");
            }
            Err(e) => {
                debug!(error = %e, "couldn't unregister push token");
            }
        }
        Ok(())
    }

    /// Subscribes or unsubscribes one closed group on the relay.
    ///
    /// Skipped entirely when push is disabled for this device: the guard is
    /// checked before any network traffic, not after.
    pub async fn perform_operation(
        &self,
        operation: ClosedGroupOperation,
        closed_group_public_key: &str,
        public_key: &str,
    ) -> Result<(), HushError> {
        if !self.state.registration_state().await?.enabled {
            debug!(
                group = closed_group_public_key,
                "push disabled; skipping closed group operation"
            );
            return Ok(());
        }

        let body = json!({
            "closedGroupPublicKey": closed_group_public_key,
            "pubKey": public_key,
        });
        if let Err(e) = self.dispatch(operation.endpoint(), body).await {
            debug!(
                group = closed_group_public_key,
                error = %e,
                "closed group operation failed"
            );
        }
        Ok(())
    }

    /// One relay call, normalizing application-level rejection into an error.
    async fn dispatch(&self, endpoint: &str, body: serde_json::Value) -> Result<(), HushError> {
        let request = OnionRequest::new(self.server.clone(), endpoint, body);
        let response = self.dispatcher.send_onion_request(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(HushError::Rejected {
                code: response.code.unwrap_or(-1),
                message: response.message.unwrap_or_else(|| "null".into()),
            })
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
