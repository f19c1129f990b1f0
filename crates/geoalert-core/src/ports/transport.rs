//! DeliveryTransport port - 1 回の配送試行

use async_trait::async_trait;

use crate::domain::{DeliveryOutcome, WebhookTask};

/// DeliveryTransport は 1 タスクにつき 1 回の HTTP リクエストを実行する
///
/// # 設計原則
/// - body は試行ごとに組み立てる（`date_request` は送信時刻）
/// - レスポンス body は読み捨ててから status を返す
/// - 分類（retry するかどうか）は行わない。それは classifier の仕事
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn send(&self, task: &WebhookTask) -> DeliveryOutcome;
}
