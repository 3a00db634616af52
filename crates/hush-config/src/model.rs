// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Hush messenger client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use hush_core::ServerTarget;
use serde::{Deserialize, Serialize};

/// Top-level Hush configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HushConfig {
    /// Destination server identities and dispatch tunables.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Push registration settings.
    #[serde(default)]
    pub push: PushConfig,
}

/// Destination server identities and onion dispatch tunables.
///
/// Server identities are static configuration: a base URL plus the
/// long-lived public key used to seal the onion envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// The push-relay notification server.
    #[serde(default = "default_push_server")]
    pub push_server: ServerTarget,

    /// The attachment file server.
    #[serde(default = "default_file_server")]
    pub file_server: ServerTarget,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per onion dispatch call before the transport failure
    /// surfaces to the job layer.
    #[serde(default = "default_dispatch_max_attempts")]
    pub dispatch_max_attempts: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            push_server: default_push_server(),
            file_server: default_file_server(),
            request_timeout_secs: default_request_timeout_secs(),
            dispatch_max_attempts: default_dispatch_max_attempts(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file. Defaults to
    /// `$XDG_DATA_HOME/hush/hush.db`.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Push registration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    /// Freshness window for an uploaded device token, in milliseconds.
    /// A re-register with an unchanged token inside this window is a
    /// no-op unless forced.
    #[serde(default = "default_token_expiry_ms")]
    pub token_expiry_ms: i64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            token_expiry_ms: default_token_expiry_ms(),
        }
    }
}

fn default_push_server() -> ServerTarget {
    ServerTarget::new(
        "https://live.apns.getsession.org",
        "642a6585919742e5a2d4dc51244964fbcd8bcab2b75612407de58b810740d049",
    )
}

fn default_file_server() -> ServerTarget {
    ServerTarget::new(
        "https://file.getsession.org",
        "62509d59bdead9bd0d396df769963e87f289da6e388fd2a9a92c0e229721a51d",
    )
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_dispatch_max_attempts() -> u32 {
    4
}

fn default_db_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("hush/hush.db").to_string_lossy().into_owned())
        .unwrap_or_else(|| "hush.db".to_string())
}

// 12 hours.
fn default_token_expiry_ms() -> i64 {
    12 * 60 * 60 * 1000
}
