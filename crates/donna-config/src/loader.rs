// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./donna.toml` > `~/.config/donna/donna.toml` > `/etc/donna/donna.toml`
//! with environment variable overrides via `DONNA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DonnaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/donna/donna.toml` (system-wide)
/// 3. `~/.config/donna/donna.toml` (user XDG config)
/// 4. `./donna.toml` (local directory)
/// 5. `DONNA_*` environment variables
pub fn load_config() -> Result<DonnaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DonnaConfig::default()))
        .merge(Toml::file("/etc/donna/donna.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("donna/donna.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("donna.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DonnaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DonnaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DonnaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DonnaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `DONNA_TELEGRAM_BOT_TOKEN` must
/// map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("DONNA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: DONNA_TELEGRAM_BOT_TOKEN -> "telegram_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("anthropic_", "anthropic.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("google_", "google.", 1)
            .replacen("session_", "session.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_load_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[agent]
name = "donna-test"

[anthropic]
max_tokens = 512
"#,
        )
        .unwrap();
        assert_eq!(config.agent.name, "donna-test");
        assert_eq!(config.anthropic.max_tokens, 512);
        // Untouched sections keep their defaults.
        assert_eq!(config.session.max_tool_rounds, 4);
    }

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.agent.name, "donna");
    }

    #[test]
    fn unknown_section_key_fails() {
        let result = load_config_from_str(
            r#"
[telegram]
bot_tken = "123:abc"
"#,
        );
        assert!(result.is_err());
    }
}
