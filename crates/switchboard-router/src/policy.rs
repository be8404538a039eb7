// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback-chain construction from caller preference, tier policy, and
//! registry state.
//!
//! Priority order: explicit caller preference > operator force pin >
//! configured tier ladder > registry declaration order. The chain never
//! repeats a (provider, model) pair and is capped at
//! `routing.max_chain_length`.

use std::collections::HashSet;

use tracing::info;

use switchboard_config::model::{CandidatePref, RoutingConfig};
use switchboard_core::{ComplexityTier, HealthStatus, SwitchboardError};

use crate::registry::ProviderRegistry;

/// Caller-supplied routing preference. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePreference {
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl RoutePreference {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn provider(name: impl Into<String>) -> Self {
        Self {
            provider: Some(name.into()),
            model: None,
        }
    }

    pub fn model(name: impl Into<String>) -> Self {
        Self {
            provider: None,
            model: Some(name.into()),
        }
    }

    pub fn pair(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            model: Some(model.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.provider.is_none() && self.model.is_none()
    }

    fn describe(&self) -> String {
        match (&self.provider, &self.model) {
            (Some(p), Some(m)) => format!("{p}/{m}"),
            (Some(p), None) => p.clone(),
            (None, Some(m)) => format!("model {m}"),
            (None, None) => "none".to_string(),
        }
    }
}

/// One entry in a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub provider: String,
    pub model: String,
    /// Human-readable reason for this candidate's position.
    pub reason: String,
}

/// An ordered fallback chain for one request.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// Tier that governed the chain. Reports moderate when tier routing
    /// is disabled, regardless of the classified tier.
    pub tier: ComplexityTier,
    /// Candidates in attempt order. Never empty.
    pub candidates: Vec<Candidate>,
}

impl RoutingDecision {
    pub fn first(&self) -> &Candidate {
        &self.candidates[0]
    }
}

/// Builds fallback chains from the routing configuration and live registry
/// state.
pub struct RoutingPolicy {
    config: RoutingConfig,
}

impl RoutingPolicy {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Build the fallback chain for one request.
    ///
    /// Returns `NoProviderAvailable` when no routable candidate exists at
    /// all. An unavailable explicit preference does not fail the request;
    /// the substitution is noted on the first fallback candidate instead.
    pub fn route(
        &self,
        preference: &RoutePreference,
        tier: ComplexityTier,
        registry: &ProviderRegistry,
    ) -> Result<RoutingDecision, SwitchboardError> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut substitution: Option<String> = None;

        // 1. Explicit caller preference heads the chain when routable.
        if !preference.is_empty() {
            match self.resolve_preference(preference, registry) {
                Some((provider, model)) => {
                    push_candidate(
                        &mut candidates,
                        &mut seen,
                        provider,
                        model,
                        "explicitly requested".to_string(),
                    );
                }
                None => {
                    substitution =
                        Some(format!("substituted for unavailable {}", preference.describe()));
                }
            }
        }

        // 2. Operator pin from config, ranked below an explicit preference.
        if candidates.is_empty()
            && let (Some(provider), Some(model)) =
                (&self.config.force_provider, &self.config.force_model)
            && registry.is_available(provider, model)
        {
            push_candidate(
                &mut candidates,
                &mut seen,
                provider.clone(),
                model.clone(),
                "pinned by routing.force_provider".to_string(),
            );
        }

        // 3. Configured tier ladder, in declaration order. With tier routing
        //    disabled everything walks the moderate ladder.
        let effective_tier = if self.config.enabled {
            tier
        } else {
            ComplexityTier::Moderate
        };
        for pref in self.tier_prefs(effective_tier) {
            if !registry.is_available(&pref.provider, &pref.model) {
                continue;
            }
            let mut reason = format!("{effective_tier} tier preference");
            if registry.health(&pref.provider) == Some(HealthStatus::Degraded) {
                reason.push_str(" (health degraded)");
            }
            push_candidate(
                &mut candidates,
                &mut seen,
                pref.provider.clone(),
                pref.model.clone(),
                reason,
            );
        }

        // 4. Registry declaration order fills whatever the ladder missed.
        for view in registry.list_available() {
            for model in &view.models {
                let mut reason = "registry declaration order fallback".to_string();
                if view.health == HealthStatus::Degraded {
                    reason.push_str(" (health degraded)");
                }
                push_candidate(
                    &mut candidates,
                    &mut seen,
                    view.name.clone(),
                    model.clone(),
                    reason,
                );
            }
        }

        // 5. Cap the chain.
        candidates.truncate(self.config.max_chain_length.max(1));

        if candidates.is_empty() {
            return Err(SwitchboardError::NoProviderAvailable {
                tier: effective_tier,
            });
        }

        if let Some(note) = substitution {
            let first = &mut candidates[0];
            first.reason = format!("{note}; {}", first.reason);
        }

        info!(
            tier = %effective_tier,
            chain_length = candidates.len(),
            first_provider = %candidates[0].provider,
            first_model = %candidates[0].model,
            "routing decision"
        );

        Ok(RoutingDecision {
            tier: effective_tier,
            candidates,
        })
    }

    /// Resolve a partial preference against the registry.
    ///
    /// Provider-only preferences take the provider's first declared model;
    /// model-only preferences take the first routable provider serving that
    /// model, in declaration order.
    fn resolve_preference(
        &self,
        preference: &RoutePreference,
        registry: &ProviderRegistry,
    ) -> Option<(String, String)> {
        match (&preference.provider, &preference.model) {
            (Some(provider), Some(model)) => registry
                .is_available(provider, model)
                .then(|| (provider.clone(), model.clone())),
            (Some(provider), None) => {
                if registry.health(provider)? == HealthStatus::Down {
                    return None;
                }
                let first = registry.descriptor(provider)?.models.first()?;
                Some((provider.clone(), first.clone()))
            }
            (None, Some(model)) => registry
                .list_available()
                .into_iter()
                .find(|view| view.models.iter().any(|m| m == model))
                .map(|view| (view.name, model.clone())),
            (None, None) => None,
        }
    }

    fn tier_prefs(&self, tier: ComplexityTier) -> &[CandidatePref] {
        match tier {
            ComplexityTier::Simple => &self.config.simple,
            ComplexityTier::Moderate => &self.config.moderate,
            ComplexityTier::Complex => &self.config.complex,
        }
    }
}

fn push_candidate(
    candidates: &mut Vec<Candidate>,
    seen: &mut HashSet<(String, String)>,
    provider: String,
    model: String,
    reason: String,
) {
    if seen.insert((provider.clone(), model.clone())) {
        candidates.push(Candidate {
            provider,
            model,
            reason,
        });
    }
}
