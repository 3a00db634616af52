// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Hush messenger client core.

use thiserror::Error;

/// The primary error type used across all Hush adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HushError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport-level dispatch errors (relay unreachable, timeout, bad status).
    ///
    /// The dispatch client retries these a bounded number of times before
    /// surfacing them; what arrives here has already exhausted that budget.
    #[error("dispatch error: {message}")]
    Dispatch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Application-level rejection from a destination server (non-zero `code`).
    #[error("server rejected request with code {code}: {message}")]
    Rejected { code: i64, message: String },

    /// A stored job payload could not be decoded for its type key.
    #[error("cannot decode job payload for type key {type_key}: {message}")]
    Decode { type_key: String, message: String },

    /// An inbound envelope is structurally invalid and will never process.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HushError {
    /// Wraps an arbitrary error as a storage error.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HushError::Storage {
            source: Box::new(source),
        }
    }

    /// Builds a dispatch error with an underlying source.
    pub fn dispatch<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HushError::Dispatch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
