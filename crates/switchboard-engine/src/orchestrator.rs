// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential fallback execution over a routed candidate chain.
//!
//! The orchestrator walks the chain one candidate at a time. Each attempt
//! sends the caller's prompts and options unchanged with only the model
//! swapped, runs under the per-attempt timeout, and on failure the chain
//! advances immediately with no backoff delay. The full attempt history
//! comes back in an [`ExecutionReport`] whether the chain succeeded or
//! not; converting exhaustion into a user-visible error happens at the
//! service boundary.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_config::model::RoutingConfig;
use switchboard_core::{
    AttemptSummary, GenerationRequest, GenerationResponse, ProviderErrorKind, SwitchboardError,
};
use switchboard_router::{Candidate, ProviderRegistry, RoutingDecision};

/// Terminal outcome of one provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Error,
    Timeout,
    Cancelled,
}

/// One attempt as recorded in the execution ledger.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub provider: String,
    pub model: String,
    pub outcome: AttemptOutcome,
    /// Failure classification. `None` for success and cancellation.
    pub error_kind: Option<ProviderErrorKind>,
    /// ISO 8601 timestamp.
    pub started_at: String,
    /// ISO 8601 timestamp.
    pub ended_at: String,
}

/// How the chain as a whole ended.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// A candidate produced a response and the chain stopped there.
    Success {
        provider: String,
        model: String,
        response: GenerationResponse,
    },
    /// Every candidate failed.
    Exhausted,
    /// The caller cancelled before any candidate succeeded.
    Cancelled,
}

/// Full record of one chain execution: every attempt in order plus the
/// terminal outcome.
#[derive(Debug)]
pub struct ExecutionReport {
    pub attempts: Vec<AttemptRecord>,
    pub outcome: ExecutionOutcome,
}

impl ExecutionReport {
    /// The provider/model pair accountable for this request: the succeeded
    /// candidate, or the last one attempted.
    pub fn accountable(&self) -> Option<(&str, &str)> {
        match &self.outcome {
            ExecutionOutcome::Success {
                provider, model, ..
            } => Some((provider, model)),
            _ => self
                .attempts
                .last()
                .map(|a| (a.provider.as_str(), a.model.as_str())),
        }
    }

    /// Failed attempts summarized for
    /// [`SwitchboardError::AllProvidersExhausted`].
    pub fn failure_summaries(&self) -> Vec<AttemptSummary> {
        self.attempts
            .iter()
            .filter_map(|a| {
                a.error_kind.map(|kind| AttemptSummary {
                    provider: a.provider.clone(),
                    model: a.model.clone(),
                    kind,
                })
            })
            .collect()
    }
}

/// Walks the fallback chain for one request.
pub struct ExecutionOrchestrator {
    attempt_timeout: Duration,
}

impl ExecutionOrchestrator {
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        }
    }

    /// Execute the chain until a candidate succeeds, the chain is
    /// exhausted, or `cancel` fires.
    ///
    /// Successes and failures are reported back to the registry's health
    /// accounting; a cancelled attempt is reported to neither side. The
    /// in-flight call of a cancelled attempt is dropped and recorded as
    /// `Cancelled`, never as a success.
    pub async fn execute(
        &self,
        registry: &ProviderRegistry,
        decision: &RoutingDecision,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> ExecutionReport {
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        for candidate in &decision.candidates {
            if cancel.is_cancelled() {
                debug!("cancelled before the next candidate was attempted");
                return ExecutionReport {
                    attempts,
                    outcome: ExecutionOutcome::Cancelled,
                };
            }

            let started_at = now_iso();
            let Some(adapter) = registry.adapter(&candidate.provider) else {
                // Candidates come from the same registry, so this only
                // fires for a hand-built decision naming an unknown provider.
                warn!(
                    provider = candidate.provider.as_str(),
                    "candidate has no registered adapter"
                );
                attempts.push(record(
                    candidate,
                    started_at,
                    AttemptOutcome::Error,
                    Some(ProviderErrorKind::Unavailable),
                ));
                continue;
            };

            let attempt_request = GenerationRequest {
                model: candidate.model.clone(),
                ..request.clone()
            };
            info!(
                provider = candidate.provider.as_str(),
                model = candidate.model.as_str(),
                attempt = attempts.len() + 1,
                reason = candidate.reason.as_str(),
                "attempting candidate"
            );

            let result = tokio::select! {
                _ = cancel.cancelled() => None,
                outcome = tokio::time::timeout(
                    self.attempt_timeout,
                    adapter.generate(attempt_request),
                ) => Some(outcome),
            };

            match result {
                None => {
                    warn!(
                        provider = candidate.provider.as_str(),
                        model = candidate.model.as_str(),
                        "attempt cancelled"
                    );
                    attempts.push(record(
                        candidate,
                        started_at,
                        AttemptOutcome::Cancelled,
                        None,
                    ));
                    return ExecutionReport {
                        attempts,
                        outcome: ExecutionOutcome::Cancelled,
                    };
                }
                Some(Ok(Ok(response))) => {
                    registry.report_success(&candidate.provider);
                    attempts.push(record(
                        candidate,
                        started_at,
                        AttemptOutcome::Success,
                        None,
                    ));
                    info!(
                        provider = candidate.provider.as_str(),
                        model = candidate.model.as_str(),
                        attempts = attempts.len(),
                        "chain succeeded"
                    );
                    return ExecutionReport {
                        attempts,
                        outcome: ExecutionOutcome::Success {
                            provider: candidate.provider.clone(),
                            model: candidate.model.clone(),
                            response,
                        },
                    };
                }
                Some(Ok(Err(e))) => {
                    let kind = provider_error_kind(&e);
                    warn!(
                        provider = candidate.provider.as_str(),
                        model = candidate.model.as_str(),
                        kind = %kind,
                        error = %e,
                        "attempt failed, advancing chain"
                    );
                    registry.report_failure(&candidate.provider);
                    attempts.push(record(
                        candidate,
                        started_at,
                        AttemptOutcome::Error,
                        Some(kind),
                    ));
                }
                Some(Err(_elapsed)) => {
                    warn!(
                        provider = candidate.provider.as_str(),
                        model = candidate.model.as_str(),
                        timeout_secs = self.attempt_timeout.as_secs(),
                        "attempt timed out, advancing chain"
                    );
                    registry.report_failure(&candidate.provider);
                    attempts.push(record(
                        candidate,
                        started_at,
                        AttemptOutcome::Timeout,
                        Some(ProviderErrorKind::Timeout),
                    ));
                }
            }
        }

        warn!(attempts = attempts.len(), "all candidates exhausted");
        ExecutionReport {
            attempts,
            outcome: ExecutionOutcome::Exhausted,
        }
    }
}

fn record(
    candidate: &Candidate,
    started_at: String,
    outcome: AttemptOutcome,
    error_kind: Option<ProviderErrorKind>,
) -> AttemptRecord {
    AttemptRecord {
        provider: candidate.provider.clone(),
        model: candidate.model.clone(),
        outcome,
        error_kind,
        started_at,
        ended_at: now_iso(),
    }
}

fn provider_error_kind(err: &SwitchboardError) -> ProviderErrorKind {
    match err {
        SwitchboardError::Provider { kind, .. } => *kind,
        _ => ProviderErrorKind::Unavailable,
    }
}

fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
