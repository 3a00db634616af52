// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading and defaults.

use hush_config::{HushConfig, load_config_from_str};

#[test]
fn empty_config_yields_defaults() {
    let config = load_config_from_str("").unwrap();

    assert_eq!(
        config.network.push_server.base_url,
        "https://live.apns.getsession.org"
    );
    assert_eq!(
        config.network.push_server.public_key,
        "642a6585919742e5a2d4dc51244964fbcd8bcab2b75612407de58b810740d049"
    );
    assert_eq!(config.network.dispatch_max_attempts, 4);
    assert_eq!(config.push.token_expiry_ms, 12 * 60 * 60 * 1000);
}

#[test]
fn toml_overrides_defaults() {
    let config = load_config_from_str(
        r#"
        [network]
        request_timeout_secs = 5
        dispatch_max_attempts = 2

        [network.push_server]
        base_url = "https://push.test.local"
        public_key = "00"

        [storage]
        db_path = "/tmp/hush-test.db"
        "#,
    )
    .unwrap();

    assert_eq!(config.network.request_timeout_secs, 5);
    assert_eq!(config.network.dispatch_max_attempts, 2);
    assert_eq!(config.network.push_server.base_url, "https://push.test.local");
    assert_eq!(config.storage.db_path, "/tmp/hush-test.db");
    // Untouched sections keep their defaults.
    assert_eq!(config.push.token_expiry_ms, 43_200_000);
}

#[test]
fn unknown_keys_are_rejected() {
    let result = load_config_from_str(
        r#"
        [network]
        not_a_real_key = true
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn defaults_match_serde_defaults() {
    // `HushConfig::default()` and an empty TOML load must agree, otherwise
    // figment's Serialized::defaults layer would fight the serde defaults.
    let from_default = HushConfig::default();
    let from_empty = load_config_from_str("").unwrap();
    assert_eq!(
        toml::to_string(&from_default).unwrap(),
        toml::to_string(&from_empty).unwrap()
    );
}
