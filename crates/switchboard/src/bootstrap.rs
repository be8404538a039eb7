// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service bootstrap shared by commands that need the full engine.
//!
//! Opens storage, registers every enabled provider adapter, and
//! assembles the [`Switchboard`] facade. Registration order sets the
//! registry fallback order: local Ollama first, then Anthropic, then
//! OpenAI.

use std::sync::Arc;

use tracing::info;

use switchboard_anthropic::AnthropicProvider;
use switchboard_config::SwitchboardConfig;
use switchboard_core::SwitchboardError;
use switchboard_engine::Switchboard;
use switchboard_ollama::OllamaProvider;
use switchboard_openai::OpenAiProvider;
use switchboard_router::ProviderRegistry;
use switchboard_storage::{Database, SqliteConversationStore, SqliteDeliverableStore};
use switchboard_usage::UsageLedger;

/// A fully wired service plus the handles the caller shuts down with.
pub struct Runtime {
    pub service: Switchboard,
    pub registry: Arc<ProviderRegistry>,
    pub db: Database,
}

/// Open storage, register enabled providers, and assemble the service.
pub async fn start(config: &SwitchboardConfig) -> Result<Runtime, SwitchboardError> {
    let db = Database::open(&config.storage).await?;
    info!(path = %config.storage.database_path, "database opened");

    let registry = Arc::new(build_registry(config)?);

    let conversations = Arc::new(SqliteConversationStore::new(db.connection().clone()));
    let deliverables = Arc::new(SqliteDeliverableStore::new(db.connection().clone()));
    let ledger = UsageLedger::new(db.connection().clone(), &config.usage);

    let service = Switchboard::new(config, registry.clone(), conversations, deliverables, ledger);
    info!(providers = registry.len(), "service assembled");

    Ok(Runtime {
        service,
        registry,
        db,
    })
}

/// Register every enabled provider adapter with its configured models.
fn build_registry(config: &SwitchboardConfig) -> Result<ProviderRegistry, SwitchboardError> {
    let mut registry = ProviderRegistry::new(config.health.failure_threshold);

    if config.ollama.enabled {
        let provider = OllamaProvider::new(&config.ollama)?;
        registry.register(Arc::new(provider), config.ollama.models.clone())?;
    }

    if config.anthropic.enabled {
        let provider = AnthropicProvider::new(&config.anthropic).inspect_err(|_| {
            eprintln!(
                "error: Anthropic API key required. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable."
            );
        })?;
        registry.register(Arc::new(provider), config.anthropic.models.clone())?;
    }

    if config.openai.enabled {
        let provider = OpenAiProvider::new(&config.openai).inspect_err(|_| {
            eprintln!(
                "error: OpenAI API key required. Set openai.api_key in config or OPENAI_API_KEY environment variable."
            );
        })?;
        registry.register(Arc::new(provider), config.openai.models.clone())?;
    }

    if registry.is_empty() {
        return Err(SwitchboardError::Config(
            "no providers enabled; enable ollama, anthropic, or openai in config".into(),
        ));
    }

    Ok(registry)
}
