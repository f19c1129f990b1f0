//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **RedisDeliveryQueue**: 本番用の配送キュー
//! - **HttpTransport**: reqwest による webhook 送信
//! - **InMemoryDeliveryQueue**: 開発・テスト用の配送キュー
//! - **ScriptedTransport**: 応答を台本で決めるテスト用 transport

pub mod http_transport;
pub mod inmem_delivery;
pub mod redis_delivery;
pub mod scripted_transport;

// 主要な型を再エクスポート
pub use self::http_transport::{DEFAULT_REQUEST_TIMEOUT, HttpTransport};
pub use self::inmem_delivery::InMemoryDeliveryQueue;
pub use self::redis_delivery::{DEFAULT_QUEUE_KEY, RedisDeliveryQueue};
pub use self::scripted_transport::{RecordedAttempt, ScriptedReply, ScriptedTransport};
