// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registry tracking capability and health.
//!
//! Descriptors and adapter handles are fixed at registration time; only
//! health and the consecutive-failure counter mutate afterward, through
//! per-provider atomics. Concurrent routing reads never take a lock, and
//! declaration order is the deterministic tie-break order for routing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use tracing::{info, warn};

use switchboard_core::{
    HealthStatus, ProviderAdapter, ProviderDescriptor, ProviderKind, SwitchboardError,
};

const HEALTH_UP: u8 = 0;
const HEALTH_DEGRADED: u8 = 1;
const HEALTH_DOWN: u8 = 2;

fn encode_health(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Up => HEALTH_UP,
        HealthStatus::Degraded => HEALTH_DEGRADED,
        HealthStatus::Down => HEALTH_DOWN,
    }
}

fn decode_health(raw: u8) -> HealthStatus {
    match raw {
        HEALTH_UP => HealthStatus::Up,
        HEALTH_DEGRADED => HealthStatus::Degraded,
        _ => HealthStatus::Down,
    }
}

struct ProviderEntry {
    descriptor: ProviderDescriptor,
    adapter: Arc<dyn ProviderAdapter>,
    health: AtomicU8,
    consecutive_failures: AtomicU32,
}

/// A provider as seen by one routing decision: the static descriptor plus
/// the health observed at read time.
#[derive(Debug, Clone)]
pub struct ProviderView {
    pub name: String,
    pub kind: ProviderKind,
    pub models: Vec<String>,
    pub health: HealthStatus,
}

/// Registry of the providers available to the routing engine.
///
/// Registration happens once during startup wiring; afterward the registry
/// is shared behind an `Arc` and only health transitions mutate it.
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
    by_name: HashMap<String, usize>,
    /// Consecutive failures before Up becomes Degraded; twice this count
    /// becomes Down.
    failure_threshold: u32,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_names())
            .field("failure_threshold", &self.failure_threshold)
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Register a provider serving the given models. Order of registration
    /// is the tie-break order used by routing.
    ///
    /// The descriptor is derived from the adapter itself, so name, kind, and
    /// compliance policy can never disagree with the running code. Rejects
    /// duplicate names, empty model lists, and external adapters missing
    /// their training opt-out header.
    pub fn register(
        &mut self,
        adapter: Arc<dyn ProviderAdapter>,
        models: Vec<String>,
    ) -> Result<(), SwitchboardError> {
        let name = adapter.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(SwitchboardError::Config(format!(
                "provider `{name}` registered twice"
            )));
        }
        if models.is_empty() {
            return Err(SwitchboardError::Config(format!(
                "provider `{name}` has no models"
            )));
        }
        if adapter.kind() == ProviderKind::External && !adapter.compliance().is_required() {
            return Err(SwitchboardError::Config(format!(
                "external provider `{name}` must carry a training opt-out header"
            )));
        }

        let descriptor = ProviderDescriptor {
            name: name.clone(),
            kind: adapter.kind(),
            models,
            compliance: *adapter.compliance(),
        };
        info!(
            provider = %descriptor.name,
            kind = %descriptor.kind,
            models = descriptor.models.len(),
            "provider registered"
        );

        self.by_name.insert(name, self.entries.len());
        self.entries.push(ProviderEntry {
            descriptor,
            adapter,
            health: AtomicU8::new(HEALTH_UP),
            consecutive_failures: AtomicU32::new(0),
        });
        Ok(())
    }

    /// Routable providers (health not Down) in declaration order.
    pub fn list_available(&self) -> Vec<ProviderView> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let health = decode_health(entry.health.load(Ordering::Relaxed));
                if health == HealthStatus::Down {
                    return None;
                }
                Some(ProviderView {
                    name: entry.descriptor.name.clone(),
                    kind: entry.descriptor.kind,
                    models: entry.descriptor.models.clone(),
                    health,
                })
            })
            .collect()
    }

    /// Whether any local provider is currently routable.
    pub fn is_local_available(&self) -> bool {
        self.entries.iter().any(|entry| {
            entry.descriptor.kind == ProviderKind::Local
                && decode_health(entry.health.load(Ordering::Relaxed)) != HealthStatus::Down
        })
    }

    /// Whether a specific (provider, model) pair is currently routable.
    pub fn is_available(&self, provider: &str, model: &str) -> bool {
        self.entry(provider).is_some_and(|entry| {
            decode_health(entry.health.load(Ordering::Relaxed)) != HealthStatus::Down
                && entry.descriptor.models.iter().any(|m| m == model)
        })
    }

    /// Current health of a provider, or `None` for unknown names.
    pub fn health(&self, provider: &str) -> Option<HealthStatus> {
        self.entry(provider)
            .map(|entry| decode_health(entry.health.load(Ordering::Relaxed)))
    }

    /// The adapter handle for a provider.
    pub fn adapter(&self, provider: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.entry(provider).map(|entry| Arc::clone(&entry.adapter))
    }

    /// The static descriptor for a provider.
    pub fn descriptor(&self, provider: &str) -> Option<&ProviderDescriptor> {
        self.entry(provider).map(|entry| &entry.descriptor)
    }

    /// Record one failed attempt against a provider.
    ///
    /// At `failure_threshold` consecutive failures the provider transitions
    /// to Degraded, at twice the threshold to Down. The transition is read
    /// by later routing decisions, never by the in-flight one.
    pub fn report_failure(&self, provider: &str) {
        let Some(entry) = self.entry(provider) else {
            return;
        };
        let failures = entry.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        let new_health = if failures >= self.failure_threshold * 2 {
            HealthStatus::Down
        } else if failures >= self.failure_threshold {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        };
        let previous = decode_health(
            entry
                .health
                .swap(encode_health(new_health), Ordering::Relaxed),
        );
        if previous != new_health {
            warn!(
                provider,
                failures,
                from = %previous,
                to = %new_health,
                "provider health transition"
            );
        }
    }

    /// Record one successful attempt: the failure streak resets and the
    /// provider returns to Up.
    pub fn report_success(&self, provider: &str) {
        let Some(entry) = self.entry(provider) else {
            return;
        };
        entry.consecutive_failures.store(0, Ordering::Relaxed);
        let previous = decode_health(entry.health.swap(HEALTH_UP, Ordering::Relaxed));
        if previous != HealthStatus::Up {
            info!(provider, from = %previous, "provider recovered");
        }
    }

    /// Apply a probe result directly (background prober only).
    pub fn set_health(&self, provider: &str, status: HealthStatus) {
        let Some(entry) = self.entry(provider) else {
            return;
        };
        if status == HealthStatus::Up {
            entry.consecutive_failures.store(0, Ordering::Relaxed);
        }
        let previous = decode_health(entry.health.swap(encode_health(status), Ordering::Relaxed));
        if previous != status {
            info!(provider, from = %previous, to = %status, "probe updated provider health");
        }
    }

    /// Registered provider names in declaration order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.descriptor.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, provider: &str) -> Option<&ProviderEntry> {
        self.by_name.get(provider).map(|&i| &self.entries[i])
    }
}
