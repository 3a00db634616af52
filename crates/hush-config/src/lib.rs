// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for the Hush messenger client.
//!
//! TOML files merged with `HUSH_`-prefixed environment variables, carrying
//! the static destination-server identities and runtime tunables.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{HushConfig, NetworkConfig, PushConfig, StorageConfig};
