// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./switchboard.toml` > `~/.config/switchboard/switchboard.toml`
//! > `/etc/switchboard/switchboard.toml` with environment variable overrides
//! via `SWITCHBOARD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SwitchboardConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/switchboard/switchboard.toml` (system-wide)
/// 3. `~/.config/switchboard/switchboard.toml` (user XDG config)
/// 4. `./switchboard.toml` (local directory)
/// 5. `SWITCHBOARD_*` environment variables
pub fn load_config() -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file("/etc/switchboard/switchboard.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("switchboard/switchboard.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("switchboard.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `SWITCHBOARD_ROUTING_MAX_CHAIN_LENGTH`
/// must map to `routing.max_chain_length`, not `routing.max.chain.length`.
fn env_provider() -> Env {
    Env::prefixed("SWITCHBOARD_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: SWITCHBOARD_ANTHROPIC_API_KEY -> "anthropic_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("routing_", "routing.", 1)
            .replacen("anthropic_", "anthropic.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("ollama_", "ollama.", 1)
            .replacen("usage_", "usage.", 1)
            .replacen("health_", "health.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_sources() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.service.name, "switchboard");
        assert_eq!(config.routing.max_chain_length, 3);
    }

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[service]
name = "switchboard-staging"

[routing]
attempt_timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.service.name, "switchboard-staging");
        assert_eq!(config.routing.attempt_timeout_secs, 5);
        // Untouched sections keep defaults.
        assert!(config.storage.wal_mode);
    }

    #[test]
    #[serial_test::serial]
    fn env_var_overrides_section_key() {
        // SAFETY: test-only env mutation, serialized across the process.
        unsafe {
            std::env::set_var("SWITCHBOARD_ANTHROPIC_API_KEY", "sk-from-env");
        }
        let config = Figment::new()
            .merge(Serialized::defaults(SwitchboardConfig::default()))
            .merge(env_provider())
            .extract::<SwitchboardConfig>()
            .unwrap();
        unsafe {
            std::env::remove_var("SWITCHBOARD_ANTHROPIC_API_KEY");
        }
        assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-from-env"));
    }

    #[test]
    #[serial_test::serial]
    fn env_var_maps_underscore_keys_correctly() {
        unsafe {
            std::env::set_var("SWITCHBOARD_ROUTING_MAX_CHAIN_LENGTH", "2");
        }
        let config = Figment::new()
            .merge(Serialized::defaults(SwitchboardConfig::default()))
            .merge(env_provider())
            .extract::<SwitchboardConfig>()
            .unwrap();
        unsafe {
            std::env::remove_var("SWITCHBOARD_ROUTING_MAX_CHAIN_LENGTH");
        }
        assert_eq!(config.routing.max_chain_length, 2);
    }
}
