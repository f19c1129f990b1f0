//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて配送パイプラインを実装します。
//!
//! # 主要コンポーネント
//! - **TaskProducer**: 危険判定の結果だけをキューに積む
//! - **Classifier**: 送信結果を Success / Retryable / Terminal に分類
//! - **WorkerLoop**: 配送ループ（dequeue→send→classify→decide→requeue/drop）
//! - **WebhookManager**: producer と worker のワイヤリング
//! - **HealthChecker**: 依存先の生存確認

pub mod classifier;
pub mod health;
pub mod manager;
pub mod producer;
pub mod status;
pub mod worker_loop;

// 主要な型を再エクスポート
pub use self::classifier::{classify, classify_status};
pub use self::health::{HealthChecker, HealthReport, QueueProbe};
pub use self::manager::{ManagerError, WebhookManager};
pub use self::producer::TaskProducer;
pub use self::status::{DeliveryCounts, DeliveryStats};
pub use self::worker_loop::{DeliveryWorker, WorkerHandle, WorkerSettings};
