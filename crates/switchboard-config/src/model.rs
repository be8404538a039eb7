// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Switchboard routing service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Switchboard configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// Service identity and request defaults.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Routing policy and classifier settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Anthropic provider settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI provider settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama local provider settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Usage telemetry settings.
    #[serde(default)]
    pub usage: UsageConfig,

    /// Provider health probing settings.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Service identity and request defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data classification tag stamped on usage records when the caller
    /// supplies none.
    #[serde(default = "default_data_classification")]
    pub data_classification: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            data_classification: default_data_classification(),
        }
    }
}

fn default_service_name() -> String {
    "switchboard".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_classification() -> String {
    "internal".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("switchboard").join("switchboard.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("switchboard.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// One provider/model preference entry in a tier's ordered candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CandidatePref {
    pub provider: String,
    pub model: String,
}

impl CandidatePref {
    pub fn new(provider: &str, model: &str) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
        }
    }
}

/// Routing policy configuration.
///
/// Controls complexity classification and the per-tier candidate preference
/// lists the policy engine walks when building a fallback chain. List order
/// is priority order; the first available entry becomes the primary
/// candidate for that tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Enable tier-based routing. When false every request routes through
    /// the moderate tier's preference list.
    #[serde(default = "default_routing_enabled")]
    pub enabled: bool,

    /// Maximum candidates in one fallback chain. Caps worst-case latency.
    #[serde(default = "default_max_chain_length")]
    pub max_chain_length: usize,

    /// Timeout applied to each individual provider attempt, in seconds.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Pin all requests to one provider, bypassing tier policy (explicit
    /// per-request preferences still win). Example: "anthropic"
    #[serde(default)]
    pub force_provider: Option<String>,

    /// Model to pair with `force_provider`. Ignored when `force_provider`
    /// is unset.
    #[serde(default)]
    pub force_model: Option<String>,

    /// Classifier confidence below which the tier defaults to moderate.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Ordered candidate preferences for simple-tier requests.
    #[serde(default = "default_simple_prefs")]
    pub simple: Vec<CandidatePref>,

    /// Ordered candidate preferences for moderate-tier requests.
    #[serde(default = "default_moderate_prefs")]
    pub moderate: Vec<CandidatePref>,

    /// Ordered candidate preferences for complex-tier requests.
    #[serde(default = "default_complex_prefs")]
    pub complex: Vec<CandidatePref>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: default_routing_enabled(),
            max_chain_length: default_max_chain_length(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            force_provider: None,
            force_model: None,
            confidence_threshold: default_confidence_threshold(),
            simple: default_simple_prefs(),
            moderate: default_moderate_prefs(),
            complex: default_complex_prefs(),
        }
    }
}

fn default_routing_enabled() -> bool {
    true
}

fn default_max_chain_length() -> usize {
    3
}

fn default_attempt_timeout_secs() -> u64 {
    30
}

fn default_confidence_threshold() -> f32 {
    0.4
}

fn default_simple_prefs() -> Vec<CandidatePref> {
    vec![
        CandidatePref::new("ollama", "llama3.1:8b"),
        CandidatePref::new("anthropic", "claude-haiku-4-5-20250901"),
        CandidatePref::new("openai", "gpt-4o-mini"),
    ]
}

fn default_moderate_prefs() -> Vec<CandidatePref> {
    vec![
        CandidatePref::new("anthropic", "claude-sonnet-4-20250514"),
        CandidatePref::new("openai", "gpt-4o"),
        CandidatePref::new("ollama", "llama3.1:8b"),
    ]
}

fn default_complex_prefs() -> Vec<CandidatePref> {
    vec![
        CandidatePref::new("anthropic", "claude-opus-4-20250514"),
        CandidatePref::new("openai", "gpt-4o"),
        CandidatePref::new("anthropic", "claude-sonnet-4-20250514"),
    ]
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Register this provider with the routing engine.
    #[serde(default = "default_provider_enabled")]
    pub enabled: bool,

    /// Anthropic API key. `None` requires the ANTHROPIC_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL, overridable for proxies.
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Anthropic API version string.
    #[serde(default = "default_anthropic_api_version")]
    pub api_version: String,

    /// Model identifiers this provider serves, in preference order.
    #[serde(default = "default_anthropic_models")]
    pub models: Vec<String>,

    /// Maximum tokens to generate when the request does not specify.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            enabled: default_provider_enabled(),
            api_key: None,
            base_url: default_anthropic_base_url(),
            api_version: default_anthropic_api_version(),
            models: default_anthropic_models(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_provider_enabled() -> bool {
    true
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_anthropic_models() -> Vec<String> {
    vec![
        "claude-haiku-4-5-20250901".to_string(),
        "claude-sonnet-4-20250514".to_string(),
        "claude-opus-4-20250514".to_string(),
    ]
}

fn default_max_tokens() -> u32 {
    4096
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Register this provider with the routing engine.
    #[serde(default = "default_provider_enabled")]
    pub enabled: bool,

    /// OpenAI API key. `None` requires the OPENAI_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL, overridable for proxies.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model identifiers this provider serves, in preference order.
    #[serde(default = "default_openai_models")]
    pub models: Vec<String>,

    /// Maximum tokens to generate when the request does not specify.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            enabled: default_provider_enabled(),
            api_key: None,
            base_url: default_openai_base_url(),
            models: default_openai_models(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_models() -> Vec<String> {
    vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string()]
}

/// Ollama local provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Register this provider with the routing engine.
    #[serde(default = "default_provider_enabled")]
    pub enabled: bool,

    /// Ollama server URL.
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model identifiers this provider serves, in preference order.
    #[serde(default = "default_ollama_models")]
    pub models: Vec<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: default_provider_enabled(),
            base_url: default_ollama_base_url(),
            models: default_ollama_models(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_models() -> Vec<String> {
    vec!["llama3.1:8b".to_string()]
}

/// Usage telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UsageConfig {
    /// Retries for a failed usage insert before the record is dropped
    /// (with a warning). Writes never block or fail the response.
    #[serde(default = "default_write_retries")]
    pub write_retries: u32,

    /// Delay between usage insert retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            write_retries: default_write_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_write_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    250
}

/// Provider health probing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Interval between background health probes, in seconds.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,

    /// Consecutive failures before a provider is marked degraded. Twice
    /// this count marks it down.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval_secs(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

fn default_probe_interval_secs() -> u64 {
    60
}

fn default_failure_threshold() -> u32 {
    3
}
