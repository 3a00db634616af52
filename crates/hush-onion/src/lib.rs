// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Onion-routed request dispatch for the Hush messenger client.
//!
//! Every outbound network call in the client goes through this layer
//! rather than a direct connection: requests are sealed into a relay
//! envelope and POSTed to the fixed relay path on the destination, with a
//! bounded per-call transport retry.

pub mod client;
pub mod envelope;

pub use client::{DEFAULT_MAX_ATTEMPTS, OnionClient, RELAY_PATH};
pub use envelope::{EnvelopeSealer, PlaintextSealer};
