//! WebhookManager - producer と worker のワイヤリング
//!
//! 構築した時点で worker が動き出す。`stop()` / `shutdown()` で止める。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::producer::TaskProducer;
use super::status::DeliveryCounts;
use super::worker_loop::{DeliveryWorker, WorkerHandle};
use crate::config::WebhookConfig;
use crate::domain::{EnqueueError, LocationCheckResult, TransportError};
use crate::impls::HttpTransport;
use crate::ports::{DangerNotifier, DeliveryQueue, DeliveryTransport};

/// ManagerError は manager 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("failed to build webhook transport: {0}")]
    Transport(#[from] TransportError),
}

/// WebhookManager は配送パイプライン全体を保持
///
/// # 使用例
/// ```ignore
/// let manager = WebhookManager::with_http(&config.webhook, queue)?;
/// manager.enqueue(result, None, None).await?;
/// manager.shutdown().await;
/// ```
pub struct WebhookManager {
    producer: TaskProducer,
    worker: WorkerHandle,
}

impl WebhookManager {
    /// Wire the producer and spawn the worker. Must run inside a tokio runtime.
    pub fn start(
        config: &WebhookConfig,
        queue: Arc<dyn DeliveryQueue>,
        transport: Arc<dyn DeliveryTransport>,
    ) -> Self {
        let producer = TaskProducer::new(
            Arc::clone(&queue),
            config.default_url.clone(),
            config.default_method,
        );
        let worker = DeliveryWorker::new(
            queue,
            transport,
            config.retry_policy(),
            config.worker_settings(),
        )
        .spawn();

        info!(
            default_url = %config.default_url,
            default_method = %config.default_method,
            max_retries = config.max_retries,
            "webhook manager started"
        );
        Self { producer, worker }
    }

    /// Same as [`start`](Self::start) with an [`HttpTransport`] built from `config`.
    pub fn with_http(
        config: &WebhookConfig,
        queue: Arc<dyn DeliveryQueue>,
    ) -> Result<Self, ManagerError> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Ok(Self::start(config, queue, Arc::new(transport)))
    }

    pub async fn enqueue(
        &self,
        result: LocationCheckResult,
        url: Option<&str>,
        method: Option<&str>,
    ) -> Result<(), EnqueueError> {
        self.producer.enqueue(result, url, method).await
    }

    pub fn producer(&self) -> &TaskProducer {
        &self.producer
    }

    pub fn worker(&self) -> &WorkerHandle {
        &self.worker
    }

    /// Signal the worker to stop. No task is dequeued after this returns.
    pub fn stop(&self) {
        self.worker.stop();
    }

    /// Stop and wait for the worker to finish.
    pub async fn shutdown(self) -> DeliveryCounts {
        let counts = self.worker.shutdown().await;
        info!(delivered = counts.delivered, requeued = counts.requeued, "webhook manager stopped");
        counts
    }
}

#[async_trait]
impl DangerNotifier for WebhookManager {
    async fn notify(
        &self,
        result: LocationCheckResult,
        url: Option<&str>,
        method: Option<&str>,
    ) -> Result<(), EnqueueError> {
        self.enqueue(result, url, method).await
    }
}
