//! DeliveryQueue port - 配送キュー（Redis または InMemory）
//!
//! DeliveryQueue は WebhookTask を JSON として保持する FIFO リストです。
//!
//! # 実装
//! - **RedisDeliveryQueue**: 本番用（RPUSH / BLPOP）
//! - **InMemoryDeliveryQueue**: 開発・テスト用

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{QueueError, WebhookTask};

/// DeliveryQueue は配送待ちタスクのキュー
///
/// # 設計原則
/// - enqueue / requeue は末尾に追加（requeue は元の位置に戻らない）
/// - dequeue は先頭から取り出す blocking pop（timeout 付き）
/// - timeout は `Ok(None)`。エラーは store / decode の障害のみ
/// - pop と「処理中」の記録は分離されていない（pop 後のクラッシュでタスクは失われる）
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Serialize the task and append it to the tail.
    async fn enqueue(&self, task: &WebhookTask) -> Result<(), QueueError>;

    /// Pop from the head, waiting at most `wait` for an item.
    async fn dequeue(&self, wait: Duration) -> Result<Option<WebhookTask>, QueueError>;

    /// Put a retried task back. Same as `enqueue`: it lands at the tail,
    /// behind anything that arrived meanwhile.
    async fn requeue(&self, task: &WebhookTask) -> Result<(), QueueError> {
        self.enqueue(task).await
    }

    /// Liveness probe.
    async fn ping(&self) -> Result<(), QueueError>;

    /// Number of tasks currently queued.
    async fn depth(&self) -> Result<usize, QueueError>;

    /// Name reported by health checks.
    fn name(&self) -> &str;
}
