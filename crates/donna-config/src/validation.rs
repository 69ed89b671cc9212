// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and loop bounds.

use crate::diagnostic::ConfigError;
use crate::model::DonnaConfig;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DonnaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !VALID_LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of {}, got `{}`",
                VALID_LOG_LEVELS.join(", "),
                config.agent.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.session.max_tool_rounds == 0 {
        errors.push(ConfigError::Validation {
            message: "session.max_tool_rounds must be at least 1".to_string(),
        });
    }

    // The window must hold at least one full tool round (assistant + tool)
    // on top of the user turn, or history reconstruction degenerates.
    if config.session.history_window_turns < 3 {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.history_window_turns must be at least 3, got {}",
                config.session.history_window_turns
            ),
        });
    }

    if config.session.call_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.call_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.anthropic.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "anthropic.max_tokens must be at least 1".to_string(),
        });
    }

    // client_id and client_secret only make sense together.
    if config.google.client_id.is_some() != config.google.client_secret.is_some() {
        errors.push(ConfigError::Validation {
            message: "google.client_id and google.client_secret must be set together".to_string(),
        });
    }

    if config.google.scopes.iter().any(|s| s.trim().is_empty()) {
        errors.push(ConfigError::Validation {
            message: "google.scopes must not contain empty entries".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
