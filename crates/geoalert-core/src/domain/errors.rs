//! Errors - 境界ごとのエラー型
//!
//! - EnqueueError: producer に同期的に返す
//! - QueueError: store の障害（enqueue / dequeue / ping）
//! - TransportError: 1 回の配送試行の失敗
//! - ConfigError: 起動時設定の不正

use thiserror::Error;

/// Failure of a queue operation.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to serialize task: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to deserialize queued task: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("queue store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid queue configuration: {0}")]
    InvalidConfig(String),
}

/// Rejection returned to the producer at enqueue time.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("invalid input: is_danger cannot be false (check_id={check_id})")]
    NotDangerous { check_id: String },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Failure of one delivery attempt before a status code was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    /// The request could not be built (bad URL, unsupported scheme, ...).
    #[error("failed to build request: {0}")]
    Build(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TransportError {
    /// Network-level failures are worth another attempt; malformed requests are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connect(_) | TransportError::Request(_)
        )
    }
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::timeout(TransportError::Timeout("t".into()), true)]
    #[case::connect(TransportError::Connect("refused".into()), true)]
    #[case::request(TransportError::Request("reset".into()), true)]
    #[case::build(TransportError::Build("bad url".into()), false)]
    fn transport_error_retryability(#[case] err: TransportError, #[case] retryable: bool) {
        assert_eq!(err.is_retryable(), retryable);
    }

    #[test]
    fn not_dangerous_names_the_check() {
        let err = EnqueueError::NotDangerous {
            check_id: "chk-3".to_string(),
        };
        assert!(err.to_string().contains("chk-3"));
        assert!(err.to_string().contains("is_danger"));
    }
}
