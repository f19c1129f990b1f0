//! ScriptedTransport - 応答を事前に決めておくテスト用 transport
//!
//! Each call to `send` consumes the next scripted reply; once the script runs
//! out the last reply repeats. Every attempt is recorded with the body that
//! would have been sent.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DeliveryOutcome, HttpMethod, RequestBody, TransportError, WebhookTask};
use crate::ports::{Clock, DeliveryTransport, SystemClock};

/// One scripted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedReply {
    Status(u16),
    /// Behave like a refused connection.
    ConnectionRefused,
    /// Behave like a client-side timeout.
    TimedOut,
}

impl ScriptedReply {
    fn to_outcome(self) -> DeliveryOutcome {
        match self {
            ScriptedReply::Status(status) => DeliveryOutcome::Responded { status },
            ScriptedReply::ConnectionRefused => {
                DeliveryOutcome::Failed(TransportError::Connect("connection refused".to_string()))
            }
            ScriptedReply::TimedOut => {
                DeliveryOutcome::Failed(TransportError::Timeout("operation timed out".to_string()))
            }
        }
    }
}

/// What the worker asked the transport to send.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAttempt {
    pub check_id: String,
    pub retry_count: u32,
    pub method: HttpMethod,
    pub url: String,
    pub body: RequestBody,
}

pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedReply>>,
    last: Mutex<ScriptedReply>,
    attempts: Mutex<Vec<RecordedAttempt>>,
    latency: Duration,
    clock: Arc<dyn Clock>,
}

impl ScriptedTransport {
    /// Replies in order, then keeps repeating the final one.
    /// An empty script answers `200`.
    pub fn new(script: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let script: VecDeque<_> = script.into_iter().collect();
        let last = script.back().copied().unwrap_or(ScriptedReply::Status(200));
        Self {
            script: Mutex::new(script),
            last: Mutex::new(last),
            attempts: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replies with the given status codes in order.
    pub fn statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self::new(statuses.into_iter().map(ScriptedReply::Status))
    }

    /// Always replies with `status`.
    pub fn always(status: u16) -> Self {
        Self::statuses([status])
    }

    /// Simulate an in-flight call that takes `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn attempts(&self) -> Vec<RecordedAttempt> {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self) -> ScriptedReply {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reply) = script.pop_front() {
            *last = reply;
        }
        *last
    }
}

#[async_trait]
impl DeliveryTransport for ScriptedTransport {
    async fn send(&self, task: &WebhookTask) -> DeliveryOutcome {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedAttempt {
                check_id: task.check_id().to_string(),
                retry_count: task.retry_count(),
                method: task.method(),
                url: task.url().to_string(),
                body: RequestBody::for_attempt(task, self.clock.now()),
            });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_reply().to_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LocationCheckResult;

    fn task() -> WebhookTask {
        WebhookTask::new(
            LocationCheckResult::dangerous("c", "u", "1", "2"),
            "http://hook",
            HttpMethod::Get,
        )
    }

    #[tokio::test]
    async fn replays_script_then_repeats_last() {
        let transport = ScriptedTransport::statuses([503, 200]);
        let t = task();

        let statuses: Vec<_> = [
            transport.send(&t).await,
            transport.send(&t).await,
            transport.send(&t).await,
        ]
        .iter()
        .map(DeliveryOutcome::status)
        .collect();

        assert_eq!(statuses, vec![Some(503), Some(200), Some(200)]);
        assert_eq!(transport.attempt_count(), 3);
        assert_eq!(transport.attempts()[0].body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn failures_have_no_status() {
        let transport = ScriptedTransport::new([ScriptedReply::ConnectionRefused]);
        let outcome = transport.send(&task()).await;
        assert!(matches!(
            outcome,
            DeliveryOutcome::Failed(TransportError::Connect(_))
        ));
    }
}
