// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for onion-routed dispatch.
//!
//! Provides [`OnionClient`], which seals a request via the
//! [`EnvelopeSealer`](crate::envelope::EnvelopeSealer) seam, POSTs the
//! envelope to the fixed relay path on the destination server, and retries
//! transport-level failures a bounded number of times per call.
//!
//! This call-level retry is nested inside the job-level backoff retry: a
//! job whose dispatch exhausts these attempts surfaces a retryable failure
//! and may be re-executed later by the scheduler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hush_core::{HushError, OnionDispatcher, OnionRequest, OnionResponse};
use tracing::{debug, warn};

use crate::envelope::{EnvelopeSealer, PlaintextSealer};

/// Fixed relay endpoint every destination server exposes.
pub const RELAY_PATH: &str = "/loki/v2/lsrpc";

/// Attempts per call before a transport failure surfaces to the caller.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Onion dispatch client.
#[derive(Clone)]
pub struct OnionClient {
    http: reqwest::Client,
    sealer: Arc<dyn EnvelopeSealer>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl OnionClient {
    /// Creates a client with the pass-through sealer.
    ///
    /// `timeout` bounds each individual HTTP attempt; `max_attempts` is the
    /// call-level transport retry cap (4 unless configured otherwise).
    pub fn new(timeout: Duration, max_attempts: u32) -> Result<Self, HushError> {
        Self::with_sealer(timeout, max_attempts, Arc::new(PlaintextSealer))
    }

    /// Creates a client with a caller-provided envelope sealer.
    pub fn with_sealer(
        timeout: Duration,
        max_attempts: u32,
        sealer: Arc<dyn EnvelopeSealer>,
    ) -> Result<Self, HushError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HushError::dispatch("failed to build HTTP client", e))?;
        Ok(Self {
            http,
            sealer,
            max_attempts: max_attempts.max(1),
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Overrides the pause between transport retries (tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn attempt(
        &self,
        url: &str,
        envelope: &serde_json::Value,
    ) -> Result<OnionResponse, HushError> {
        let response = self
            .http
            .post(url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| HushError::dispatch("relay request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HushError::Dispatch {
                message: format!("relay returned HTTP {status}"),
                source: None,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HushError::dispatch("invalid relay response body", e))?;
        Ok(OnionResponse::from_json(body))
    }
}

#[async_trait]
impl OnionDispatcher for OnionClient {
    async fn send_onion_request(&self, request: OnionRequest) -> Result<OnionResponse, HushError> {
        let envelope = self.sealer.seal(&request)?;
        let url = format!(
            "{}{}",
            request.destination.base_url.trim_end_matches('/'),
            RELAY_PATH
        );

        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                warn!(
                    attempt,
                    endpoint = %request.endpoint,
                    "retrying onion dispatch after transport error"
                );
                tokio::time::sleep(self.retry_delay).await;
            }

            match self.attempt(&url, &envelope).await {
                Ok(response) => {
                    // Application-level rejection is the caller's to
                    // interpret; only transport failures are retried here.
                    if !response.is_success() {
                        debug!(
                            endpoint = %request.endpoint,
                            code = ?response.code,
                            message = response.message.as_deref().unwrap_or("null"),
                            "destination rejected onion request"
                        );
                    }
                    return Ok(response);
                }
                Err(e) => {
                    debug!(endpoint = %request.endpoint, error = %e, "onion dispatch attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| HushError::Internal("dispatch loop made no attempts".into())))
    }
}
