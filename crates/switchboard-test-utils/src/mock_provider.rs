// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with a scripted outcome
//! queue, enabling fast, CI-runnable tests of routing, fallback, and
//! timeout behavior without external API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use switchboard_core::{
    CompliancePolicy, GenerationRequest, GenerationResponse, HealthStatus, ProviderAdapter,
    ProviderErrorKind, ProviderKind, SwitchboardError, TokenUsage,
};

/// Opt-out policy used by external mock providers. Registration requires
/// external adapters to carry one, and tests should not claim a real
/// provider family's header.
pub const MOCK_OPT_OUT: CompliancePolicy = CompliancePolicy::TrainingOptOut {
    header: "x-mock-no-training",
    value: "opt-out",
};

enum MockOutcome {
    Reply(String),
    Failure(ProviderErrorKind, String),
    /// Sleeps before replying. With a paused tokio clock this triggers the
    /// orchestrator's attempt timeout without real waiting.
    Delayed(String, Duration),
}

/// A mock provider that plays back a scripted queue of outcomes.
///
/// Outcomes are popped FIFO per `generate` call. When the queue is empty,
/// a default "mock response" text is returned. Every call increments a
/// counter so tests can assert how many attempts reached this provider.
pub struct MockProvider {
    name: String,
    kind: ProviderKind,
    compliance: CompliancePolicy,
    outcomes: Mutex<VecDeque<MockOutcome>>,
    calls: AtomicUsize,
    /// Every request passed to `generate`, in arrival order.
    requests: Mutex<Vec<GenerationRequest>>,
    /// `None` makes `health_check` return an error.
    health: Mutex<Option<HealthStatus>>,
}

impl MockProvider {
    /// Create a local mock provider (no compliance header).
    pub fn local(name: &str) -> Self {
        Self::with_kind(name, ProviderKind::Local, CompliancePolicy::NotRequired)
    }

    /// Create an external mock provider carrying [`MOCK_OPT_OUT`].
    pub fn external(name: &str) -> Self {
        Self::with_kind(name, ProviderKind::External, MOCK_OPT_OUT)
    }

    fn with_kind(name: &str, kind: ProviderKind, compliance: CompliancePolicy) -> Self {
        Self {
            name: name.to_string(),
            kind,
            compliance,
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            health: Mutex::new(Some(HealthStatus::Up)),
        }
    }

    /// Override the compliance policy (e.g. to test registration rejection).
    pub fn with_compliance(mut self, compliance: CompliancePolicy) -> Self {
        self.compliance = compliance;
        self
    }

    /// Queue a successful reply.
    pub fn with_reply(mut self, text: &str) -> Self {
        self.outcomes
            .get_mut()
            .push_back(MockOutcome::Reply(text.to_string()));
        self
    }

    /// Queue a provider error.
    pub fn with_failure(mut self, kind: ProviderErrorKind, message: &str) -> Self {
        self.outcomes
            .get_mut()
            .push_back(MockOutcome::Failure(kind, message.to_string()));
        self
    }

    /// Queue a reply that sleeps for `delay` before returning.
    pub fn with_delayed_reply(mut self, text: &str, delay: Duration) -> Self {
        self.outcomes
            .get_mut()
            .push_back(MockOutcome::Delayed(text.to_string(), delay));
        self
    }

    /// Add a reply to the end of the queue after construction.
    pub async fn push_reply(&self, text: &str) {
        self.outcomes
            .lock()
            .await
            .push_back(MockOutcome::Reply(text.to_string()));
    }

    /// Add a provider error to the end of the queue after construction.
    pub async fn push_failure(&self, kind: ProviderErrorKind, message: &str) {
        self.outcomes
            .lock()
            .await
            .push_back(MockOutcome::Failure(kind, message.to_string()));
    }

    /// Number of `generate` calls that reached this provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// The requests seen by `generate`, in arrival order.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    /// Set the status returned by `health_check`.
    pub async fn set_health(&self, status: HealthStatus) {
        *self.health.lock().await = Some(status);
    }

    /// Make `health_check` return an error.
    pub async fn fail_health_checks(&self) {
        *self.health.lock().await = None;
    }

    async fn next_outcome(&self) -> MockOutcome {
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockOutcome::Reply("mock response".to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn compliance(&self) -> &CompliancePolicy {
        &self.compliance
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, SwitchboardError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().await.push(request);
        match self.next_outcome().await {
            MockOutcome::Reply(text) => Ok(GenerationResponse {
                text,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                },
            }),
            MockOutcome::Failure(kind, message) => Err(SwitchboardError::Provider {
                provider: self.name.clone(),
                kind,
                message,
            }),
            MockOutcome::Delayed(text, delay) => {
                tokio::time::sleep(delay).await;
                Ok(GenerationResponse {
                    text,
                    usage: TokenUsage {
                        input_tokens: 10,
                        output_tokens: 20,
                    },
                })
            }
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        match *self.health.lock().await {
            Some(status) => Ok(status),
            None => Err(SwitchboardError::Provider {
                provider: self.name.clone(),
                kind: ProviderErrorKind::Unavailable,
                message: "health check failed".to_string(),
            }),
        }
    }
}
