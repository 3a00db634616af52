// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Onion dispatch trait: relayed delivery of HTTP-shaped requests.

use async_trait::async_trait;

use crate::error::HushError;
use crate::types::{OnionRequest, OnionResponse};

/// Delivers a request to a named destination server through the
/// anonymizing relay, without the destination learning the caller's
/// network identity.
///
/// Implementations retry transport-level failures a small, fixed number
/// of times per call. That inner retry is independent of and nested
/// inside the job-level backoff retry: a job may be re-executed by the
/// scheduler even after a call here has exhausted its own attempts.
#[async_trait]
pub trait OnionDispatcher: Send + Sync {
    /// Sends the request and returns the parsed reply.
    ///
    /// An `Ok` response may still carry a non-zero application-level
    /// `code`; interpreting that is the caller's business (see
    /// [`OnionResponse::is_success`]).
    async fn send_onion_request(&self, request: OnionRequest) -> Result<OnionResponse, HushError>;
}
