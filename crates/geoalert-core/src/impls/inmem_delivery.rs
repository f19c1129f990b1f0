//! InMemoryDeliveryQueue - 開発・テスト用の配送キュー
//!
//! # 実装メモ
//! - タスクは Redis と同じく JSON 文字列として保持する（serde の経路も通す）
//! - tokio::sync::Mutex + Notify による blocking pop
//! - pop はロック内で完結し、その後に await がないので cancel-safe

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::{QueueError, WebhookTask};
use crate::ports::DeliveryQueue;

/// InMemoryDeliveryQueue は開発用の配送キュー
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryDeliveryQueue::new();
/// queue.enqueue(&task).await?;
/// let task = queue.dequeue(Duration::from_secs(5)).await?;
/// ```
pub struct InMemoryDeliveryQueue {
    items: Mutex<VecDeque<String>>,
    /// enqueue 時の通知用
    notify: Notify,
    /// store 障害のシミュレーション
    unavailable: AtomicBool,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every operation fail with `QueueError::Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Decoded copy of the queue contents, head first.
    pub async fn snapshot(&self) -> Vec<WebhookTask> {
        self.items
            .lock()
            .await
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    fn check_available(&self) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable(
                "in-memory queue marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn enqueue(&self, task: &WebhookTask) -> Result<(), QueueError> {
        self.check_available()?;
        let raw = serde_json::to_string(task).map_err(QueueError::Serialization)?;
        self.items.lock().await.push_back(raw);
        // 待機中の dequeue に通知
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, wait: Duration) -> Result<Option<WebhookTask>, QueueError> {
        let deadline = Instant::now() + wait;
        loop {
            self.check_available()?;

            // 先に通知の受け口を作ってからキューを見る（取りこぼし防止）
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(raw) = self.items.lock().await.pop_front() {
                return serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(QueueError::Deserialization);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ping(&self) -> Result<(), QueueError> {
        self.check_available()
    }

    async fn depth(&self) -> Result<usize, QueueError> {
        self.check_available()?;
        Ok(self.len().await)
    }

    fn name(&self) -> &str {
        "InMemoryQueue"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HttpMethod, LocationCheckResult};
    use std::sync::Arc;

    fn task(id: &str) -> WebhookTask {
        WebhookTask::new(
            LocationCheckResult::dangerous(id, "user", "1.0", "2.0"),
            "http://hook",
            HttpMethod::Post,
        )
    }

    #[tokio::test]
    async fn test_enqueue_dequeue_roundtrip() {
        let queue = InMemoryDeliveryQueue::new();
        queue.enqueue(&task("a")).await.unwrap();

        let popped = queue.dequeue(Duration::from_secs(1)).await.unwrap();
        assert_eq!(popped, Some(task("a")));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_dequeue_is_fifo() {
        let queue = InMemoryDeliveryQueue::new();
        for id in ["a", "b", "c"] {
            queue.enqueue(&task(id)).await.unwrap();
        }

        let mut order = Vec::new();
        while let Some(t) = queue.dequeue(Duration::from_millis(10)).await.unwrap() {
            order.push(t.check_id().to_string());
        }
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_requeue_goes_to_the_tail() {
        let queue = InMemoryDeliveryQueue::new();
        queue.enqueue(&task("old")).await.unwrap();
        queue.enqueue(&task("new")).await.unwrap();

        let mut retried = queue.dequeue(Duration::from_millis(10)).await.unwrap().unwrap();
        retried.record_retry();
        queue.requeue(&retried).await.unwrap();

        let ids: Vec<_> = queue
            .snapshot()
            .await
            .into_iter()
            .map(|t| (t.check_id().to_string(), t.retry_count()))
            .collect();
        assert_eq!(ids, vec![("new".to_string(), 0), ("old".to_string(), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dequeue_timeout() {
        let queue = InMemoryDeliveryQueue::new();
        let start = Instant::now();
        let popped = queue.dequeue(Duration::from_millis(500)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(popped, None);
    }

    #[tokio::test]
    async fn test_enqueue_wakes_dequeue() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());

        let waiter = tokio::spawn({
            let queue = queue.clone();
            async move { queue.dequeue(Duration::from_secs(5)).await.unwrap() }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.enqueue(&task("late")).await.unwrap();

        let popped = waiter.await.unwrap();
        assert_eq!(popped.map(|t| t.check_id().to_string()), Some("late".to_string()));
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let queue = InMemoryDeliveryQueue::new();
        queue.set_unavailable(true);

        assert!(matches!(
            queue.enqueue(&task("a")).await,
            Err(QueueError::Unavailable(_))
        ));
        assert!(queue.dequeue(Duration::from_millis(10)).await.is_err());
        assert!(queue.ping().await.is_err());

        queue.set_unavailable(false);
        assert!(queue.ping().await.is_ok());
        assert_eq!(queue.depth().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_decode_error() {
        let queue = InMemoryDeliveryQueue::new();
        queue.items.lock().await.push_back("{not json".to_string());

        assert!(matches!(
            queue.dequeue(Duration::from_millis(10)).await,
            Err(QueueError::Deserialization(_))
        ));
    }
}
