//! DeliveryEnvelope - 送信時に payload を包む wire body
//!
//! The envelope is built per attempt: `sent_at` is taken from the clock at
//! send time, never at enqueue or detection time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location::LocationCheckResult;
use super::task::{HttpMethod, WebhookTask};

/// Timestamped wrapper sent as the `POST` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEnvelope {
    #[serde(rename = "dto")]
    pub payload: LocationCheckResult,
    #[serde(rename = "date_request")]
    pub sent_at: DateTime<Utc>,
}

/// Request body of one delivery attempt.
///
/// Selected once from the task's method; the transport only matches on this.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `GET`: nothing is sent.
    Empty,
    /// `POST`: JSON-encoded envelope.
    Json(DeliveryEnvelope),
}

impl RequestBody {
    pub fn for_attempt(task: &WebhookTask, now: DateTime<Utc>) -> Self {
        match task.method() {
            HttpMethod::Get => Self::Empty,
            HttpMethod::Post => Self::Json(DeliveryEnvelope {
                payload: task.payload().clone(),
                sent_at: now,
            }),
        }
    }

    /// Encoded bytes, or `None` for an empty body.
    pub fn encode(&self) -> Result<Option<Vec<u8>>, serde_json::Error> {
        match self {
            Self::Empty => Ok(None),
            Self::Json(envelope) => serde_json::to_vec(envelope).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(method: HttpMethod) -> WebhookTask {
        WebhookTask::new(
            LocationCheckResult::dangerous("chk-9", "user-9", "1.5", "2.5"),
            "http://hook",
            method,
        )
    }

    #[test]
    fn get_has_no_body() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let body = RequestBody::for_attempt(&task(HttpMethod::Get), now);
        assert_eq!(body, RequestBody::Empty);
        assert_eq!(body.encode().unwrap(), None);
    }

    #[test]
    fn post_wraps_payload_with_send_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let body = RequestBody::for_attempt(&task(HttpMethod::Post), now);

        let bytes = body.encode().unwrap().expect("post has a body");
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["dto"]["check_id"], "chk-9");
        assert_eq!(v["date_request"], "2024-01-01T12:00:00Z");
    }

    #[test]
    fn each_attempt_takes_its_own_timestamp() {
        let t = task(HttpMethod::Post);
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 5).unwrap();

        let (RequestBody::Json(a), RequestBody::Json(b)) = (
            RequestBody::for_attempt(&t, first),
            RequestBody::for_attempt(&t, second),
        ) else {
            panic!("expected json bodies");
        };
        assert_eq!(a.payload, b.payload);
        assert!(b.sent_at > a.sent_at);
    }
}
