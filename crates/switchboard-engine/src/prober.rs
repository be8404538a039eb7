// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background health prober.
//!
//! Periodically calls `health_check` on every registered adapter and
//! applies the result to the registry, so routing sees provider outages
//! before a request has to discover them the hard way. A probe success
//! also recovers providers that passive failure tracking marked down.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_config::model::HealthConfig;
use switchboard_core::HealthStatus;
use switchboard_router::ProviderRegistry;

pub struct HealthProber {
    registry: Arc<ProviderRegistry>,
    interval: Duration,
}

impl HealthProber {
    pub fn new(registry: Arc<ProviderRegistry>, config: &HealthConfig) -> Self {
        Self {
            registry,
            interval: Duration::from_secs(config.probe_interval_secs),
        }
    }

    /// Start the probe loop. Runs until the token is cancelled.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        info!(interval_secs = self.interval.as_secs(), "health prober started");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            // Skip the first immediate tick.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.probe_all().await;
                    }
                    _ = cancel.cancelled() => {
                        info!("health prober shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Probe every registered provider once and apply the results.
    pub async fn probe_all(&self) {
        for name in self.registry.provider_names() {
            let Some(adapter) = self.registry.adapter(name) else {
                continue;
            };
            match adapter.health_check().await {
                Ok(status) => {
                    debug!(provider = name, status = %status, "health probe");
                    self.registry.set_health(name, status);
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "health probe failed, marking down");
                    self.registry.set_health(name, HealthStatus::Down);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use switchboard_test_utils::MockProvider;

    fn registry_with(mocks: &[Arc<MockProvider>]) -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new(3);
        for mock in mocks {
            registry
                .register(mock.clone(), vec!["m".to_string()])
                .unwrap();
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn probe_applies_scripted_statuses() {
        let alpha = Arc::new(MockProvider::external("alpha"));
        let beta = Arc::new(MockProvider::external("beta"));
        alpha.set_health(HealthStatus::Degraded).await;
        beta.fail_health_checks().await;
        let registry = registry_with(&[alpha, beta]);

        let prober = HealthProber::new(registry.clone(), &HealthConfig::default());
        prober.probe_all().await;

        assert_eq!(registry.health("alpha"), Some(HealthStatus::Degraded));
        assert_eq!(registry.health("beta"), Some(HealthStatus::Down));
    }

    #[tokio::test]
    async fn probe_recovers_a_down_provider() {
        let alpha = Arc::new(MockProvider::external("alpha"));
        let registry = registry_with(&[alpha]);
        registry.set_health("alpha", HealthStatus::Down);

        let prober = HealthProber::new(registry.clone(), &HealthConfig::default());
        prober.probe_all().await;

        assert_eq!(registry.health("alpha"), Some(HealthStatus::Up));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_probes_on_interval() {
        let alpha = Arc::new(MockProvider::external("alpha"));
        let registry = registry_with(&[alpha]);
        registry.set_health("alpha", HealthStatus::Down);

        let cancel = CancellationToken::new();
        let handle = HealthProber::new(registry.clone(), &HealthConfig::default())
            .spawn(cancel.clone());

        // Default probe interval is 60s; the first tick is skipped.
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(registry.health("alpha"), Some(HealthStatus::Up));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancel_stops_the_loop() {
        let registry = registry_with(&[Arc::new(MockProvider::external("alpha"))]);
        let cancel = CancellationToken::new();
        let handle =
            HealthProber::new(registry, &HealthConfig::default()).spawn(cancel.clone());

        cancel.cancel();
        handle.await.unwrap();
    }
}
