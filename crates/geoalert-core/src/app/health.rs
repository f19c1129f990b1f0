//! HealthChecker - 依存先の生存確認
//!
//! 各 probe に 500ms の期限を与え、結果を 1 つのレポートにまとめる。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ports::{DeliveryQueue, HealthCheck};

/// Deadline for a single probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

pub const STATUS_OK: &str = "ok";
pub const STATUS_UNAVAILABLE: &str = "Service Unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub server_status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct HealthChecker {
    probes: Vec<Arc<dyn HealthCheck>>,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            probes: Vec::new(),
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthCheck>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ping every probe in turn.
    pub async fn check(&self) -> HealthReport {
        let mut errors = Vec::new();

        for probe in &self.probes {
            match tokio::time::timeout(self.timeout, probe.ping()).await {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => errors.push(format!("{}: {reason}", probe.name())),
                Err(_) => errors.push(format!("{}: ping timeout", probe.name())),
            }
        }

        if errors.is_empty() {
            HealthReport {
                server_status: STATUS_OK.to_string(),
                errors,
            }
        } else {
            warn!(?errors, "health check failed");
            HealthReport {
                server_status: STATUS_UNAVAILABLE.to_string(),
                errors,
            }
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Exposes a queue's `ping` as a health probe.
pub struct QueueProbe(pub Arc<dyn DeliveryQueue>);

#[async_trait]
impl HealthCheck for QueueProbe {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn ping(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryDeliveryQueue;

    struct Hanging;

    #[async_trait]
    impl HealthCheck for Hanging {
        fn name(&self) -> &str {
            "Hanging"
        }

        async fn ping(&self) -> Result<(), String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_healthy_queue() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        let report = HealthChecker::new()
            .with_probe(Arc::new(QueueProbe(queue)))
            .check()
            .await;

        assert!(report.is_healthy());
        assert_eq!(report.server_status, "ok");
        assert_eq!(serde_json::to_value(&report).unwrap(), serde_json::json!({"server_status": "ok"}));
    }

    #[tokio::test]
    async fn test_unavailable_queue_is_reported() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        queue.set_unavailable(true);

        let report = HealthChecker::new()
            .with_probe(Arc::new(QueueProbe(queue)))
            .check()
            .await;

        assert!(!report.is_healthy());
        assert_eq!(report.server_status, "Service Unavailable");
        assert!(report.errors[0].starts_with("InMemoryQueue: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_times_out() {
        let start = tokio::time::Instant::now();
        let report = HealthChecker::new().with_probe(Arc::new(Hanging)).check().await;

        assert_eq!(report.errors, vec!["Hanging: ping timeout".to_string()]);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
