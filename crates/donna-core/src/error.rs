// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Donna calendar assistant.

use thiserror::Error;

/// The primary error type used across all Donna adapter traits and core operations.
#[derive(Debug, Error)]
pub enum DonnaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    ///
    /// Fatal for the turn in progress: no partial state is ever returned as success.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, delivery failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider errors (API failure, malformed or empty output).
    ///
    /// `status` carries the HTTP status when the failure came off the wire,
    /// so the recovery policy can classify it. `None` means the request never
    /// produced a response (connect/read failure).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Calendar gateway errors (event API failure, quota, malformed response).
    #[error("calendar error: {message}")]
    Calendar {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Credential errors: expired, revoked, or rejected by the provider.
    #[error("auth error: {message}")]
    Auth { message: String },

    /// Tool arguments did not match the declared schema.
    ///
    /// Reported back to the model as a tool error so it can self-correct,
    /// never surfaced to the end user.
    #[error("invalid arguments for tool `{tool}`: {message}")]
    InvalidArguments { tool: String, message: String },

    /// Tool-internal execution failure.
    #[error("tool error: {message}")]
    Tool { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DonnaError {
    /// The HTTP status attached to this error, when it came off the wire.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DonnaError::Provider { status, .. } | DonnaError::Calendar { status, .. } => *status,
            _ => None,
        }
    }
}
