//! RedisDeliveryQueue - 本番用の配送キュー
//!
//! Tasks are JSON strings in a Redis list: `RPUSH` appends to the tail and
//! `BLPOP` pops from the head.
//!
//! Two connections are kept. `BLPOP` parks its connection on the server for
//! the whole wait, so sharing one multiplexed connection would stall every
//! `RPUSH` from the producer behind the worker's pop.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::debug;

use crate::domain::{QueueError, WebhookTask};
use crate::ports::DeliveryQueue;

/// Redis list used when no other key is configured.
pub const DEFAULT_QUEUE_KEY: &str = "webhook:queue";

#[derive(Clone)]
pub struct RedisDeliveryQueue {
    key: String,
    /// enqueue / requeue / LLEN / PING
    producer: ConnectionManager,
    /// BLPOP 専用
    consumer: ConnectionManager,
}

impl std::fmt::Debug for RedisDeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDeliveryQueue")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl RedisDeliveryQueue {
    /// Connect to `redis_url` using [`DEFAULT_QUEUE_KEY`].
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        Self::connect_with_key(redis_url, DEFAULT_QUEUE_KEY).await
    }

    /// Connect and verify the store answers `PING`.
    pub async fn connect_with_key(redis_url: &str, key: &str) -> Result<Self, QueueError> {
        if key.is_empty() {
            return Err(QueueError::InvalidConfig("queue key cannot be empty".to_string()));
        }
        let client = redis::Client::open(redis_url)
            .map_err(|e| QueueError::InvalidConfig(format!("invalid redis url: {e}")))?;

        let producer = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| QueueError::Unavailable(format!("failed to connect to redis: {e}")))?;
        let consumer = ConnectionManager::new(client)
            .await
            .map_err(|e| QueueError::Unavailable(format!("failed to connect to redis: {e}")))?;

        let queue = Self {
            key: key.to_string(),
            producer,
            consumer,
        };
        queue.ping().await?;

        debug!(key = %queue.key, "redis delivery queue connected");
        Ok(queue)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl DeliveryQueue for RedisDeliveryQueue {
    async fn enqueue(&self, task: &WebhookTask) -> Result<(), QueueError> {
        let raw = serde_json::to_string(task).map_err(QueueError::Serialization)?;
        let mut conn = self.producer.clone();

        let len: i64 = redis::cmd("RPUSH")
            .arg(&self.key)
            .arg(raw)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Unavailable(format!("RPUSH failed: {e}")))?;

        debug!(key = %self.key, check_id = task.check_id(), len, "task pushed");
        Ok(())
    }

    async fn dequeue(&self, wait: Duration) -> Result<Option<WebhookTask>, QueueError> {
        let mut conn = self.consumer.clone();

        // BLPOP の timeout 0 は「無期限」なので、待たない pop は LPOP で行う
        let raw: Option<String> = if wait.is_zero() {
            redis::cmd("LPOP")
                .arg(&self.key)
                .query_async(&mut conn)
                .await
                .map_err(|e| QueueError::Unavailable(format!("LPOP failed: {e}")))?
        } else {
            let popped: Option<(String, String)> = redis::cmd("BLPOP")
                .arg(&self.key)
                .arg(wait.as_secs_f64())
                .query_async(&mut conn)
                .await
                .map_err(|e| QueueError::Unavailable(format!("BLPOP failed: {e}")))?;
            popped.map(|(_key, value)| value)
        };

        raw.map(|raw| serde_json::from_str(&raw).map_err(QueueError::Deserialization))
            .transpose()
    }

    async fn ping(&self) -> Result<(), QueueError> {
        let mut conn = self.producer.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Unavailable(format!("PING failed: {e}")))?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(QueueError::Unavailable(format!("unexpected PING reply: {pong}")))
        }
    }

    async fn depth(&self) -> Result<usize, QueueError> {
        let mut conn = self.producer.clone();
        let len: usize = redis::cmd("LLEN")
            .arg(&self.key)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Unavailable(format!("LLEN failed: {e}")))?;
        Ok(len)
    }

    fn name(&self) -> &str {
        "RedisQueue"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_malformed_url() {
        let err = RedisDeliveryQueue::connect("not a url").await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn rejects_empty_key() {
        let err = RedisDeliveryQueue::connect_with_key("redis://127.0.0.1:6379", "")
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidConfig(_)));
    }
}
