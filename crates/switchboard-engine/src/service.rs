// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service facade: the public `generate` and `task` operations.
//!
//! `Switchboard` wires the classifier, routing policy, registry,
//! orchestrator, coordinator, and usage ledger into the two inbound
//! operations. Every request gets a fresh run id, a routed fallback
//! chain, and exactly one usage record for its terminal outcome; chain
//! exhaustion becomes [`SwitchboardError::AllProvidersExhausted`] only
//! here, at the boundary.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_config::SwitchboardConfig;
use switchboard_core::{
    ComplexityTier, ConversationId, ConversationStore, DeliverableRef, DeliverableStore,
    GenerationOptions, GenerationRequest, Mode, RunId, SwitchboardError, TokenUsage,
};
use switchboard_router::{Classifier, ProviderRegistry, RoutePreference, RoutingPolicy};
use switchboard_usage::{UsageLedger, UsageOutcome, UsageRecord, now_timestamp};

use crate::coordinator::{ConversationCoordinator, build_prompt, converse_prompt};
use crate::orchestrator::{ExecutionOrchestrator, ExecutionOutcome, ExecutionReport};

/// Parameters for one `generate` call.
#[derive(Debug, Clone, Default)]
pub struct GenerateParams {
    pub caller_type: String,
    pub caller_id: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Explicit provider preference. Heads the chain when routable.
    pub provider: Option<String>,
    /// Explicit model preference.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Caller-asserted complexity, overriding classification.
    pub complexity_hint: Option<ComplexityTier>,
    /// Data classification stamped on the usage record. Falls back to
    /// `service.data_classification`.
    pub data_classification: Option<String>,
}

/// Reply to a successful `generate` call.
#[derive(Debug, Clone)]
pub struct GenerateReply {
    pub response: String,
    pub run_id: RunId,
    /// Provider that actually served the request, after any fallback.
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Parameters for one `task` call.
#[derive(Debug, Clone)]
pub struct TaskParams {
    pub mode: Mode,
    /// Required for `build`. Optional for `converse`: absent creates a
    /// conversation.
    pub conversation_id: Option<String>,
    pub caller_type: String,
    pub caller_id: String,
    pub user_message: String,
    pub system_prompt: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub complexity_hint: Option<ComplexityTier>,
    pub data_classification: Option<String>,
}

/// Mode-specific payload of a task reply.
#[derive(Debug, Clone)]
pub enum TaskContent {
    /// Converse: the assistant's conversational reply.
    Message(String),
    /// Build: the persisted deliverable.
    Deliverable(DeliverableRef),
}

/// Reply to a successful `task` call.
#[derive(Debug, Clone)]
pub struct TaskReply {
    pub mode: Mode,
    pub content: TaskContent,
    pub conversation_id: String,
    pub run_id: RunId,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
}

impl TaskReply {
    /// The reply text: the message for converse, the deliverable content
    /// for build.
    pub fn text(&self) -> &str {
        match &self.content {
            TaskContent::Message(text) => text,
            TaskContent::Deliverable(d) => &d.version.content,
        }
    }
}

/// Everything a usage record needs beyond the execution report itself.
struct UsageContext<'a> {
    run_id: &'a RunId,
    conversation_id: Option<&'a str>,
    caller_type: &'a str,
    caller_id: &'a str,
    tier: ComplexityTier,
    data_classification: Option<&'a str>,
    latency_ms: u64,
}

/// The assembled routing service.
pub struct Switchboard {
    classifier: Classifier,
    policy: RoutingPolicy,
    registry: Arc<ProviderRegistry>,
    orchestrator: ExecutionOrchestrator,
    coordinator: ConversationCoordinator,
    ledger: UsageLedger,
    default_classification: String,
}

impl Switchboard {
    pub fn new(
        config: &SwitchboardConfig,
        registry: Arc<ProviderRegistry>,
        conversations: Arc<dyn ConversationStore>,
        deliverables: Arc<dyn DeliverableStore>,
        ledger: UsageLedger,
    ) -> Self {
        Self {
            classifier: Classifier::new(config.routing.confidence_threshold),
            policy: RoutingPolicy::new(config.routing.clone()),
            registry,
            orchestrator: ExecutionOrchestrator::new(&config.routing),
            coordinator: ConversationCoordinator::new(conversations, deliverables),
            ledger,
            default_classification: config.service.data_classification.clone(),
        }
    }

    /// One-shot generation with tier routing and sequential fallback.
    pub async fn generate(
        &self,
        params: GenerateParams,
        cancel: CancellationToken,
    ) -> Result<GenerateReply, SwitchboardError> {
        let run_id = RunId::new();
        let started = Instant::now();

        let classification = self
            .classifier
            .classify(&params.user_prompt, params.complexity_hint);
        let preference = RoutePreference {
            provider: params.provider.clone(),
            model: params.model.clone(),
        };
        let decision = self
            .policy
            .route(&preference, classification.tier, &self.registry)?;
        info!(
            run_id = %run_id,
            tier = %decision.tier,
            confidence = classification.confidence,
            chain_length = decision.candidates.len(),
            "request routed"
        );

        let request = GenerationRequest {
            model: decision.first().model.clone(),
            system_prompt: params.system_prompt.clone(),
            user_prompt: params.user_prompt.clone(),
            options: GenerationOptions {
                temperature: params.temperature,
                max_tokens: params.max_tokens,
            },
        };
        let report = self
            .orchestrator
            .execute(&self.registry, &decision, &request, &cancel)
            .await;
        self.record_usage(
            UsageContext {
                run_id: &run_id,
                conversation_id: None,
                caller_type: &params.caller_type,
                caller_id: &params.caller_id,
                tier: decision.tier,
                data_classification: params.data_classification.as_deref(),
                latency_ms: started.elapsed().as_millis() as u64,
            },
            &report,
        );

        let failures = report.failure_summaries();
        match report.outcome {
            ExecutionOutcome::Success {
                provider,
                model,
                response,
            } => Ok(GenerateReply {
                response: response.text,
                run_id,
                provider,
                model,
                usage: response.usage,
            }),
            ExecutionOutcome::Exhausted => {
                Err(SwitchboardError::AllProvidersExhausted { attempts: failures })
            }
            ExecutionOutcome::Cancelled => Err(SwitchboardError::Internal(
                "request cancelled before completion".to_string(),
            )),
        }
    }

    /// Two-phase conversational workflow: `converse` accumulates context,
    /// `build` consumes it into a persisted deliverable.
    pub async fn task(
        &self,
        params: TaskParams,
        cancel: CancellationToken,
    ) -> Result<TaskReply, SwitchboardError> {
        match params.mode {
            Mode::Converse => self.converse(params, cancel).await,
            Mode::Build => self.build(params, cancel).await,
        }
    }

    async fn converse(
        &self,
        params: TaskParams,
        cancel: CancellationToken,
    ) -> Result<TaskReply, SwitchboardError> {
        let run_id = RunId::new();
        let started = Instant::now();

        // Lock before reading state. A fresh conversation is created
        // first; nobody else can hold its id yet.
        let (record, _guard) = match params.conversation_id.as_deref() {
            Some(id) => {
                let guard = self.coordinator.lock(id).await;
                let record = self
                    .coordinator
                    .open(&params.caller_type, &params.caller_id, Some(id))
                    .await?;
                (record, guard)
            }
            None => {
                let record = self
                    .coordinator
                    .open(&params.caller_type, &params.caller_id, None)
                    .await?;
                let guard = self.coordinator.lock(record.id.as_str()).await;
                (record, guard)
            }
        };

        let classification = self
            .classifier
            .classify(&params.user_message, params.complexity_hint);
        let preference = RoutePreference {
            provider: params.provider.clone(),
            model: params.model.clone(),
        };
        let decision = self
            .policy
            .route(&preference, classification.tier, &self.registry)?;
        info!(
            run_id = %run_id,
            conversation_id = %record.id,
            mode = %Mode::Converse,
            tier = %decision.tier,
            "task routed"
        );

        let request = GenerationRequest {
            model: decision.first().model.clone(),
            system_prompt: params.system_prompt.clone(),
            user_prompt: converse_prompt(&record.pending_context, &params.user_message),
            options: GenerationOptions {
                temperature: params.temperature,
                max_tokens: params.max_tokens,
            },
        };
        let report = self
            .orchestrator
            .execute(&self.registry, &decision, &request, &cancel)
            .await;
        self.record_usage(
            UsageContext {
                run_id: &run_id,
                conversation_id: Some(record.id.as_str()),
                caller_type: &params.caller_type,
                caller_id: &params.caller_id,
                tier: decision.tier,
                data_classification: params.data_classification.as_deref(),
                latency_ms: started.elapsed().as_millis() as u64,
            },
            &report,
        );

        let failures = report.failure_summaries();
        match report.outcome {
            ExecutionOutcome::Success {
                provider,
                model,
                response,
            } => {
                self.coordinator
                    .complete_converse(&record.id, &params.user_message, &response.text)
                    .await?;
                Ok(TaskReply {
                    mode: Mode::Converse,
                    content: TaskContent::Message(response.text),
                    conversation_id: record.id.to_string(),
                    run_id,
                    provider,
                    model,
                    usage: response.usage,
                })
            }
            ExecutionOutcome::Exhausted => {
                // The conversation is unchanged; no turns were appended.
                Err(SwitchboardError::AllProvidersExhausted { attempts: failures })
            }
            ExecutionOutcome::Cancelled => Err(SwitchboardError::Internal(
                "request cancelled before completion".to_string(),
            )),
        }
    }

    async fn build(
        &self,
        params: TaskParams,
        cancel: CancellationToken,
    ) -> Result<TaskReply, SwitchboardError> {
        let run_id = RunId::new();
        let started = Instant::now();

        let Some(id) = params.conversation_id.as_deref() else {
            return Err(SwitchboardError::MissingConversationContext {
                conversation_id: "(none)".to_string(),
            });
        };
        let _guard = self.coordinator.lock(id).await;
        let record = self.coordinator.require_buildable(id).await?;

        let classification = self
            .classifier
            .classify(&params.user_message, params.complexity_hint);
        let preference = RoutePreference {
            provider: params.provider.clone(),
            model: params.model.clone(),
        };
        let decision = self
            .policy
            .route(&preference, classification.tier, &self.registry)?;
        info!(
            run_id = %run_id,
            conversation_id = %record.id,
            mode = %Mode::Build,
            tier = %decision.tier,
            "task routed"
        );

        self.coordinator.begin_build(&record.id).await?;
        let request = GenerationRequest {
            model: decision.first().model.clone(),
            system_prompt: params.system_prompt.clone(),
            user_prompt: build_prompt(&record.pending_context, &params.user_message),
            options: GenerationOptions {
                temperature: params.temperature,
                max_tokens: params.max_tokens,
            },
        };
        let report = self
            .orchestrator
            .execute(&self.registry, &decision, &request, &cancel)
            .await;
        self.record_usage(
            UsageContext {
                run_id: &run_id,
                conversation_id: Some(record.id.as_str()),
                caller_type: &params.caller_type,
                caller_id: &params.caller_id,
                tier: decision.tier,
                data_classification: params.data_classification.as_deref(),
                latency_ms: started.elapsed().as_millis() as u64,
            },
            &report,
        );

        let failures = report.failure_summaries();
        match report.outcome {
            ExecutionOutcome::Success {
                provider,
                model,
                response,
            } => {
                let deliverable = match self
                    .coordinator
                    .complete_build(&record.id, &response.text)
                    .await
                {
                    Ok(deliverable) => deliverable,
                    Err(e) => {
                        // Persistence failed after generation; restore
                        // Conversing so the caller can retry.
                        self.restore_conversing(&record.id).await;
                        return Err(e);
                    }
                };
                Ok(TaskReply {
                    mode: Mode::Build,
                    content: TaskContent::Deliverable(deliverable),
                    conversation_id: record.id.to_string(),
                    run_id,
                    provider,
                    model,
                    usage: response.usage,
                })
            }
            ExecutionOutcome::Exhausted => {
                self.restore_conversing(&record.id).await;
                Err(SwitchboardError::AllProvidersExhausted { attempts: failures })
            }
            ExecutionOutcome::Cancelled => {
                self.restore_conversing(&record.id).await;
                Err(SwitchboardError::Internal(
                    "request cancelled before completion".to_string(),
                ))
            }
        }
    }

    async fn restore_conversing(&self, id: &ConversationId) {
        if let Err(e) = self.coordinator.abort_build(id).await {
            warn!(
                conversation_id = %id,
                error = %e,
                "failed to restore conversation state after build failure"
            );
        }
    }

    /// Record the terminal outcome on a detached task. Requests that
    /// never reached a provider leave no record.
    fn record_usage(&self, ctx: UsageContext<'_>, report: &ExecutionReport) {
        let Some((provider, model)) = report.accountable() else {
            debug!(run_id = %ctx.run_id, "no provider attempted, skipping usage record");
            return;
        };
        let outcome = match &report.outcome {
            ExecutionOutcome::Success { .. } => UsageOutcome::Success,
            ExecutionOutcome::Exhausted => UsageOutcome::Exhausted,
            ExecutionOutcome::Cancelled => UsageOutcome::Cancelled,
        };
        let usage = match &report.outcome {
            ExecutionOutcome::Success { response, .. } => response.usage,
            _ => TokenUsage::default(),
        };
        let record = UsageRecord {
            run_id: ctx.run_id.to_string(),
            conversation_id: ctx.conversation_id.map(str::to_string),
            caller_type: ctx.caller_type.to_string(),
            caller_id: ctx.caller_id.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            complexity_tier: ctx.tier,
            data_classification: ctx
                .data_classification
                .unwrap_or(&self.default_classification)
                .to_string(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            latency_ms: ctx.latency_ms,
            outcome,
            created_at: now_timestamp(),
        };
        self.ledger.record_detached(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use switchboard_config::model::{CandidatePref, RoutingConfig};
    use switchboard_core::{ProviderAdapter, ProviderErrorKind};
    use switchboard_storage::{Database, SqliteConversationStore, SqliteDeliverableStore};
    use switchboard_test_utils::MockProvider;
    use switchboard_usage::UsageTotals;

    struct Harness {
        service: Switchboard,
        registry: Arc<ProviderRegistry>,
        ledger: UsageLedger,
        _db: Database,
    }

    async fn harness(mocks: &[Arc<MockProvider>], config: SwitchboardConfig) -> Harness {
        let mut registry = ProviderRegistry::new(config.health.failure_threshold);
        for mock in mocks {
            registry
                .register(mock.clone(), vec![format!("{}-model", mock.name())])
                .unwrap();
        }
        let registry = Arc::new(registry);

        let db = Database::open_in_memory().await.unwrap();
        let conversations = Arc::new(SqliteConversationStore::new(db.connection().clone()));
        let deliverables = Arc::new(SqliteDeliverableStore::new(db.connection().clone()));
        let ledger = UsageLedger::new(db.connection().clone(), &config.usage);

        let service = Switchboard::new(
            &config,
            registry.clone(),
            conversations,
            deliverables,
            ledger.clone(),
        );
        Harness {
            service,
            registry,
            ledger,
            _db: db,
        }
    }

    /// Same candidate ladder for every tier, so classification cannot
    /// steer a test.
    fn ladder_config(prefs: &[(&str, &str)]) -> SwitchboardConfig {
        let ladder: Vec<CandidatePref> = prefs
            .iter()
            .map(|(provider, model)| CandidatePref::new(provider, model))
            .collect();
        SwitchboardConfig {
            routing: RoutingConfig {
                simple: ladder.clone(),
                moderate: ladder.clone(),
                complex: ladder,
                ..RoutingConfig::default()
            },
            ..SwitchboardConfig::default()
        }
    }

    fn tiered_config(
        simple: &[(&str, &str)],
        moderate: &[(&str, &str)],
        complex: &[(&str, &str)],
    ) -> SwitchboardConfig {
        let to_prefs = |pairs: &[(&str, &str)]| -> Vec<CandidatePref> {
            pairs
                .iter()
                .map(|(provider, model)| CandidatePref::new(provider, model))
                .collect()
        };
        SwitchboardConfig {
            routing: RoutingConfig {
                simple: to_prefs(simple),
                moderate: to_prefs(moderate),
                complex: to_prefs(complex),
                ..RoutingConfig::default()
            },
            ..SwitchboardConfig::default()
        }
    }

    fn generate_params(prompt: &str) -> GenerateParams {
        GenerateParams {
            caller_type: "cli".to_string(),
            caller_id: "tester".to_string(),
            user_prompt: prompt.to_string(),
            ..GenerateParams::default()
        }
    }

    fn task_params(mode: Mode, conversation_id: Option<&str>, message: &str) -> TaskParams {
        TaskParams {
            mode,
            conversation_id: conversation_id.map(str::to_string),
            caller_type: "cli".to_string(),
            caller_id: "tester".to_string(),
            user_message: message.to_string(),
            system_prompt: String::new(),
            provider: None,
            model: None,
            temperature: None,
            max_tokens: None,
            complexity_hint: None,
            data_classification: None,
        }
    }

    /// Usage writes land on a detached task; poll until they show up.
    async fn wait_for_recorded(ledger: &UsageLedger, expected: u64) -> UsageTotals {
        for _ in 0..200 {
            let totals = ledger.caller_totals("cli", "tester").await.unwrap();
            if totals.requests >= expected {
                return totals;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("usage records never reached {expected}");
    }

    #[tokio::test]
    async fn each_request_gets_a_distinct_run_id() {
        let alpha = Arc::new(
            MockProvider::external("alpha")
                .with_reply("one")
                .with_reply("two"),
        );
        let h = harness(&[alpha], ladder_config(&[("alpha", "alpha-model")])).await;

        let first = h
            .service
            .generate(generate_params("say one"), CancellationToken::new())
            .await
            .unwrap();
        let second = h
            .service
            .generate(generate_params("say two"), CancellationToken::new())
            .await
            .unwrap();

        assert_ne!(first.run_id, second.run_id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn success_writes_one_usage_record() {
        let alpha = Arc::new(MockProvider::external("alpha").with_reply("done"));
        let h = harness(&[alpha], ladder_config(&[("alpha", "alpha-model")])).await;

        let reply = h
            .service
            .generate(generate_params("record me"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.provider, "alpha");
        assert_eq!(reply.model, "alpha-model");
        assert_eq!(reply.usage.input_tokens, 10);

        let totals = wait_for_recorded(&h.ledger, 1).await;
        assert_eq!(totals.requests, 1);
        assert_eq!(totals.input_tokens, 10);
        assert_eq!(totals.output_tokens, 20);
    }

    #[tokio::test]
    async fn explicit_preference_heads_the_chain() {
        let alpha = Arc::new(MockProvider::external("alpha").with_reply("from alpha"));
        let beta = Arc::new(MockProvider::external("beta").with_reply("from beta"));
        let h = harness(
            &[alpha.clone(), beta.clone()],
            ladder_config(&[("alpha", "alpha-model"), ("beta", "beta-model")]),
        )
        .await;

        let mut params = generate_params("anything");
        params.provider = Some("beta".to_string());
        params.model = Some("beta-model".to_string());

        let reply = h
            .service
            .generate(params, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.provider, "beta");
        assert_eq!(alpha.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exhaustion_surfaces_attempts_and_still_records_usage() {
        let alpha = Arc::new(
            MockProvider::external("alpha").with_failure(ProviderErrorKind::Unavailable, "503"),
        );
        let beta = Arc::new(
            MockProvider::external("beta").with_failure(ProviderErrorKind::RateLimited, "429"),
        );
        let h = harness(
            &[alpha, beta],
            ladder_config(&[("alpha", "alpha-model"), ("beta", "beta-model")]),
        )
        .await;

        let err = h
            .service
            .generate(generate_params("doomed"), CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            SwitchboardError::AllProvidersExhausted { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].provider, "alpha");
                assert_eq!(attempts[1].provider, "beta");
            }
            other => panic!("unexpected error: {other}"),
        }

        let totals = wait_for_recorded(&h.ledger, 1).await;
        assert_eq!(totals.requests, 1);
        assert_eq!(totals.input_tokens, 0);
    }

    #[tokio::test]
    async fn build_without_context_makes_no_provider_calls() {
        let alpha = Arc::new(MockProvider::external("alpha").with_reply("unused"));
        let h = harness(&[alpha.clone()], ladder_config(&[("alpha", "alpha-model")])).await;

        let err = h
            .service
            .task(
                task_params(Mode::Build, Some("ghost"), "build it"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SwitchboardError::MissingConversationContext { ref conversation_id }
                if conversation_id == "ghost"
        ));

        let err = h
            .service
            .task(
                task_params(Mode::Build, None, "build it"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SwitchboardError::MissingConversationContext { .. }
        ));

        assert_eq!(alpha.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn converse_then_build_produces_a_deliverable() {
        let checklist = format!("## Release checklist\n{}", "- verify a step\n".repeat(12));
        let alpha = Arc::new(
            MockProvider::external("alpha")
                .with_reply("Which platform does the release target?")
                .with_reply(&checklist),
        );
        let h = harness(&[alpha.clone()], ladder_config(&[("alpha", "alpha-model")])).await;

        let converse = h
            .service
            .task(
                task_params(Mode::Converse, None, "plan a release"),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(converse.mode, Mode::Converse);
        assert_eq!(converse.text(), "Which platform does the release target?");

        let build = h
            .service
            .task(
                task_params(
                    Mode::Build,
                    Some(&converse.conversation_id),
                    "write the checklist",
                ),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(build.mode, Mode::Build);
        assert_eq!(build.conversation_id, converse.conversation_id);
        assert_eq!(build.provider, "alpha");
        assert_eq!(build.model, "alpha-model");
        match &build.content {
            TaskContent::Deliverable(d) => {
                assert_eq!(d.version.content, checklist);
                assert!(d.version.content.len() > 100);
            }
            other => panic!("unexpected content: {other:?}"),
        }

        // The build prompt carried the accumulated converse context.
        let seen = alpha.requests().await;
        assert_eq!(seen.len(), 2);
        assert!(seen[1].user_prompt.contains("user: plan a release"));
        assert!(seen[1].user_prompt.contains("Build request:\nwrite the checklist"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_generates_are_all_recorded() {
        let alpha = Arc::new(MockProvider::external("alpha"));
        let h = harness(&[alpha], ladder_config(&[("alpha", "alpha-model")])).await;

        let calls: Vec<_> = (0..5)
            .map(|i| {
                h.service.generate(
                    generate_params(&format!("request {i}")),
                    CancellationToken::new(),
                )
            })
            .collect();
        let results = futures::future::join_all(calls).await;

        let mut run_ids = HashSet::new();
        for result in results {
            let reply = result.unwrap();
            run_ids.insert(reply.run_id.to_string());
        }
        assert_eq!(run_ids.len(), 5);

        let totals = wait_for_recorded(&h.ledger, 5).await;
        assert_eq!(totals.requests, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn primary_timeout_falls_back_to_secondary() {
        let slow = Arc::new(
            MockProvider::external("slow")
                .with_delayed_reply("too late", Duration::from_secs(120)),
        );
        let fast = Arc::new(MockProvider::external("fast").with_reply("in time"));
        let h = harness(
            &[slow, fast],
            ladder_config(&[("slow", "slow-model"), ("fast", "fast-model")]),
        )
        .await;

        let reply = h
            .service
            .generate(generate_params("beat the clock"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.provider, "fast");
        assert_eq!(reply.response, "in time");
    }

    #[tokio::test]
    async fn simple_prompts_prefer_the_local_ladder() {
        let local = Arc::new(MockProvider::local("loc").with_reply("local says hi"));
        let external = Arc::new(MockProvider::external("ext").with_reply("external reply"));
        let h = harness(
            &[local, external.clone()],
            tiered_config(
                &[("loc", "loc-model"), ("ext", "ext-model")],
                &[("ext", "ext-model"), ("loc", "loc-model")],
                &[("ext", "ext-model")],
            ),
        )
        .await;

        // "hi" classifies simple with high confidence.
        let reply = h
            .service
            .generate(generate_params("hi"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.provider, "loc");
        assert_eq!(external.calls(), 0);
    }

    #[tokio::test]
    async fn complexity_hint_overrides_classification() {
        let local = Arc::new(MockProvider::local("loc").with_reply("local"));
        let external = Arc::new(MockProvider::external("ext").with_reply("external"));
        let h = harness(
            &[local.clone(), external],
            tiered_config(
                &[("loc", "loc-model")],
                &[("loc", "loc-model")],
                &[("ext", "ext-model")],
            ),
        )
        .await;

        let mut params = generate_params("hi");
        params.complexity_hint = Some(ComplexityTier::Complex);

        let reply = h
            .service
            .generate(params, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.provider, "ext");
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn down_provider_is_skipped() {
        let alpha = Arc::new(MockProvider::external("alpha").with_reply("unused"));
        let beta = Arc::new(MockProvider::external("beta").with_reply("substitute"));
        let h = harness(
            &[alpha.clone(), beta],
            ladder_config(&[("alpha", "alpha-model"), ("beta", "beta-model")]),
        )
        .await;

        h.registry.set_health("alpha", switchboard_core::HealthStatus::Down);

        let reply = h
            .service
            .generate(generate_params("route me"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.provider, "beta");
        assert_eq!(alpha.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_request_is_reported_and_recorded() {
        let slow = Arc::new(
            MockProvider::external("slow")
                .with_delayed_reply("never delivered", Duration::from_secs(120)),
        );
        let h = harness(&[slow], ladder_config(&[("slow", "slow-model")])).await;

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = h
            .service
            .generate(generate_params("interrupted"), cancel)
            .await
            .unwrap_err();
        trigger.await.unwrap();

        assert!(matches!(err, SwitchboardError::Internal(ref msg) if msg.contains("cancelled")));

        let totals = wait_for_recorded(&h.ledger, 1).await;
        assert_eq!(totals.requests, 1);
        assert_eq!(totals.output_tokens, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exhausted_build_returns_to_conversing() {
        let alpha = Arc::new(
            MockProvider::external("alpha")
                .with_reply("What should the report cover?")
                .with_failure(ProviderErrorKind::Unavailable, "503"),
        );
        let h = harness(&[alpha.clone()], ladder_config(&[("alpha", "alpha-model")])).await;

        let converse = h
            .service
            .task(
                task_params(Mode::Converse, None, "draft a report"),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let err = h
            .service
            .task(
                task_params(
                    Mode::Build,
                    Some(&converse.conversation_id),
                    "write the report",
                ),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::AllProvidersExhausted { .. }));

        // The context survived the failed build: a retry reaches the
        // provider again and succeeds.
        alpha.push_reply("The report, as requested.").await;
        let retried = h
            .service
            .task(
                task_params(
                    Mode::Build,
                    Some(&converse.conversation_id),
                    "write the report",
                ),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(retried.text(), "The report, as requested.");
    }
}
