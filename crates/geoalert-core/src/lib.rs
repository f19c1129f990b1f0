//! geoalert-core
//!
//! Danger-notification webhook delivery: a durable queue, a single
//! background delivery worker and the producer that feeds it.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（location, task, envelope, outcome, retry, decision, state, errors）
//! - **ports**: 抽象化レイヤー（DeliveryQueue, DeliveryTransport, Clock, DangerNotifier, HealthCheck）
//! - **impls**: 実装（RedisDeliveryQueue, HttpTransport, InMemory / Scripted のテスト用実装）
//! - **app**: アプリケーションロジック（producer, classifier, worker_loop, manager, health）
//! - **config**: 環境変数からの設定
//! - **observability**: tracing の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
