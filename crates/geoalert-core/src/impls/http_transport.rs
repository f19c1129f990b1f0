//! HttpTransport - reqwest による webhook 送信

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::domain::{DeliveryOutcome, RequestBody, TransportError, WebhookTask};
use crate::ports::{Clock, DeliveryTransport, SystemClock};

/// Per-call timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends each attempt as one HTTP request through a shared client.
///
/// The client timeout bounds every call on its own; the worker's cancellation
/// can abort a call earlier.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Self::with_clock(timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(timeout: Duration, clock: Arc<dyn Clock>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Build(format!("http client: {e}")))?;
        Ok(Self { client, clock })
    }

    async fn execute(&self, task: &WebhookTask) -> Result<u16, TransportError> {
        let url = reqwest::Url::parse(task.url())
            .map_err(|e| TransportError::Build(format!("invalid url {:?}: {e}", task.url())))?;

        // sent_at は試行ごとに取り直す
        let body = RequestBody::for_attempt(task, self.clock.now());
        let request = match body.encode().map_err(TransportError::Encode)? {
            None => self.client.get(url),
            Some(bytes) => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(bytes),
        };

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        // body は読み捨てる（コネクション再利用のため）。読めなくても status で判定する
        if let Err(e) = response.bytes().await {
            debug!(check_id = task.check_id(), status, error = %e, "failed to drain response body");
        }

        Ok(status)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn send(&self, task: &WebhookTask) -> DeliveryOutcome {
        match self.execute(task).await {
            Ok(status) => DeliveryOutcome::Responded { status },
            Err(err) => DeliveryOutcome::Failed(err),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::Build(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
