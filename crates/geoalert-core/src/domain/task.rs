use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ConfigError;
use super::location::LocationCheckResult;

/// HTTP method used to deliver a webhook. Only `GET` and `POST` are supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    #[serde(rename = "GET")]
    Get,
    #[default]
    #[serde(rename = "POST")]
    Post,
}

impl HttpMethod {
    /// Case-insensitive parse. Anything other than GET/POST is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConfigError::Invalid {
            key: "method".to_string(),
            reason: format!("unsupported webhook method {s:?}"),
        })
    }
}

/// One pending outbound notification, as stored in the delivery queue.
///
/// The payload never changes between attempts; only `retry_count` moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookTask {
    #[serde(rename = "dto")]
    payload: LocationCheckResult,
    #[serde(rename = "count_retry", default)]
    retry_count: u32,
    method: HttpMethod,
    url: String,
}

impl WebhookTask {
    pub fn new(payload: LocationCheckResult, url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            payload,
            retry_count: 0,
            method,
            url: url.into(),
        }
    }

    /// Rebuild a task that has already been retried (queue decoding, tests).
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn payload(&self) -> &LocationCheckResult {
        &self.payload
    }

    /// Check id of the payload; used to identify the task in logs.
    pub fn check_id(&self) -> &str {
        &self.payload.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Count one more retryable failure and return the new count.
    pub fn record_retry(&mut self) -> u32 {
        self.retry_count = self.retry_count.saturating_add(1);
        self.retry_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payload() -> LocationCheckResult {
        LocationCheckResult::dangerous("chk-1", "user-1", "10.0", "20.0")
    }

    #[rstest]
    #[case::upper("GET", Some(HttpMethod::Get))]
    #[case::lower("post", Some(HttpMethod::Post))]
    #[case::padded("  Get ", Some(HttpMethod::Get))]
    #[case::put("PUT", None)]
    #[case::empty("", None)]
    fn method_parse(#[case] input: &str, #[case] expected: Option<HttpMethod>) {
        assert_eq!(HttpMethod::parse(input), expected);
    }

    #[test]
    fn queued_wire_format_matches_contract() {
        let task = WebhookTask::new(payload(), "http://hook.local/a", HttpMethod::Post)
            .with_retry_count(2);

        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["dto"]["check_id"], "chk-1");
        assert_eq!(v["count_retry"], 2);
        assert_eq!(v["method"], "POST");
        assert_eq!(v["url"], "http://hook.local/a");
    }

    #[test]
    fn decodes_task_without_retry_count() {
        let json = r#"{
            "dto": {"check_id":"c","user_id":"u","latitude":"1","longitude":"2","is_danger":true},
            "method": "GET",
            "url": "http://x"
        }"#;
        let task: WebhookTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.retry_count(), 0);
        assert_eq!(task.method(), HttpMethod::Get);
    }

    #[test]
    fn unknown_method_fails_to_decode() {
        let json = r#"{
            "dto": {"check_id":"c","user_id":"u","latitude":"1","longitude":"2","is_danger":true},
            "count_retry": 0,
            "method": "DELETE",
            "url": "http://x"
        }"#;
        assert!(serde_json::from_str::<WebhookTask>(json).is_err());
    }

    #[test]
    fn record_retry_only_changes_the_counter() {
        let mut task = WebhookTask::new(payload(), "http://x", HttpMethod::Get);
        let before = task.payload().clone();

        assert_eq!(task.record_retry(), 1);
        assert_eq!(task.record_retry(), 2);
        assert_eq!(task.retry_count(), 2);
        assert_eq!(task.payload(), &before);
    }
}
