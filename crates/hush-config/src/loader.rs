// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./hush.toml` > `~/.config/hush/hush.toml`
//! > `/etc/hush/hush.toml`, with environment variable overrides via the
//! `HUSH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HushConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hush/hush.toml` (system-wide)
/// 3. `~/.config/hush/hush.toml` (user XDG config)
/// 4. `./hush.toml` (local directory)
/// 5. `HUSH_*` environment variables
pub fn load_config() -> Result<HushConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HushConfig::default()))
        .merge(Toml::file("/etc/hush/hush.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("hush/hush.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("hush.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<HushConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HushConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HushConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HushConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `HUSH_STORAGE_DB_PATH` must map to
/// `storage.db_path`, not `storage.db.path`.
fn env_provider() -> Env {
    Env::prefixed("HUSH_").map(|key| map_env_key(key.as_str()).into())
}

/// Section mapping for one prefix-stripped, lowercased env key.
///
/// Sections are matched only at the start of the key, so a section name
/// appearing inside a field name (`network_push_server_...` contains
/// `push_`) cannot be mistaken for a second section. The two server
/// tables under `network` nest one level deeper.
fn map_env_key(key: &str) -> String {
    if let Some(rest) = key.strip_prefix("network_") {
        if let Some(field) = rest.strip_prefix("push_server_") {
            return format!("network.push_server.{field}");
        }
        if let Some(field) = rest.strip_prefix("file_server_") {
            return format!("network.file_server.{field}");
        }
        return format!("network.{rest}");
    }
    if let Some(rest) = key.strip_prefix("storage_") {
        return format!("storage.{rest}");
    }
    if let Some(rest) = key.strip_prefix("push_") {
        return format!("push.{rest}");
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::map_env_key;

    #[test]
    fn sections_map_to_dotted_keys() {
        assert_eq!(map_env_key("storage_db_path"), "storage.db_path");
        assert_eq!(map_env_key("push_token_expiry_ms"), "push.token_expiry_ms");
        assert_eq!(
            map_env_key("network_request_timeout_secs"),
            "network.request_timeout_secs"
        );
    }

    #[test]
    fn server_tables_nest_under_network() {
        assert_eq!(
            map_env_key("network_push_server_base_url"),
            "network.push_server.base_url"
        );
        assert_eq!(
            map_env_key("network_file_server_public_key"),
            "network.file_server.public_key"
        );
    }

    #[test]
    fn section_names_inside_field_names_do_not_remap() {
        // `push_` after the network section must not start a second section.
        assert_eq!(
            map_env_key("network_push_server_public_key"),
            "network.push_server.public_key"
        );
        // A key without a known section passes through untouched.
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }
}
