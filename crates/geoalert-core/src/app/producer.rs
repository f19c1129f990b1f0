//! TaskProducer - 危険判定の結果を配送キューに積む
//!
//! location check の結果が危険（`is_danger == true`）のときだけ WebhookTask を作る。
//! 宛先 URL / method が不正なら設定のデフォルトに解決する。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::{EnqueueError, HttpMethod, LocationCheckResult, WebhookTask};
use crate::ports::{DangerNotifier, DeliveryQueue};

#[derive(Clone)]
pub struct TaskProducer {
    queue: Arc<dyn DeliveryQueue>,
    default_url: String,
    default_method: HttpMethod,
}

impl TaskProducer {
    pub fn new(
        queue: Arc<dyn DeliveryQueue>,
        default_url: impl Into<String>,
        default_method: HttpMethod,
    ) -> Self {
        Self {
            queue,
            default_url: default_url.into(),
            default_method,
        }
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    pub fn default_method(&self) -> HttpMethod {
        self.default_method
    }

    /// Build the task a dangerous result would produce, without queueing it.
    pub fn build_task(
        &self,
        result: LocationCheckResult,
        url: Option<&str>,
        method: Option<&str>,
    ) -> Result<WebhookTask, EnqueueError> {
        if !result.is_danger {
            return Err(EnqueueError::NotDangerous {
                check_id: result.id,
            });
        }

        let url = match url.map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.default_url.clone(),
        };
        let method = method
            .and_then(HttpMethod::parse)
            .unwrap_or(self.default_method);

        Ok(WebhookTask::new(result, url, method))
    }

    /// Validate and append one task to the queue.
    ///
    /// Only the enqueue itself is reported back; what happens to the task
    /// afterwards is visible in the worker's logs alone.
    pub async fn enqueue(
        &self,
        result: LocationCheckResult,
        url: Option<&str>,
        method: Option<&str>,
    ) -> Result<(), EnqueueError> {
        let task = match self.build_task(result, url, method) {
            Ok(task) => task,
            Err(err) => {
                debug!(error = %err, "enqueue rejected");
                return Err(err);
            }
        };

        self.queue.enqueue(&task).await?;
        info!(
            check_id = task.check_id(),
            user_id = %task.payload().user_id,
            incidents = task.payload().detected_incidents.len(),
            method = %task.method(),
            url = task.url(),
            "webhook task queued"
        );
        Ok(())
    }
}

impl std::fmt::Debug for TaskProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskProducer")
            .field("queue", &self.queue.name())
            .field("default_url", &self.default_url)
            .field("default_method", &self.default_method)
            .finish()
    }
}

#[async_trait]
impl DangerNotifier for TaskProducer {
    async fn notify(
        &self,
        result: LocationCheckResult,
        url: Option<&str>,
        method: Option<&str>,
    ) -> Result<(), EnqueueError> {
        self.enqueue(result, url, method).await
    }
}
