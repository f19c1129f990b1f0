//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部システム（Redis, webhook の受信先, 時計）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//! worker loop はテストで InMemory キューと scripted transport に差し替えて動かせます。

pub mod clock;
pub mod delivery_queue;
pub mod health;
pub mod notifier;
pub mod transport;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delivery_queue::DeliveryQueue;
pub use self::health::HealthCheck;
pub use self::notifier::DangerNotifier;
pub use self::transport::DeliveryTransport;
