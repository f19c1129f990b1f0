//! Delivery classifier: transport outcome -> verdict.
//!
//! - `status < 300` -> Success
//! - `status >= 500` or `429` -> Retryable
//! - any other status (3xx, 4xx) -> Terminal
//! - transport errors -> Retryable, unless the request could not even be built

use crate::domain::{Classification, DeliveryOutcome};

pub fn classify(outcome: &DeliveryOutcome) -> Classification {
    match outcome {
        DeliveryOutcome::Responded { status } => classify_status(*status),
        DeliveryOutcome::Failed(err) if err.is_retryable() => Classification::Retryable,
        DeliveryOutcome::Failed(_) => Classification::Terminal,
    }
}

pub fn classify_status(status: u16) -> Classification {
    if status < 300 {
        Classification::Success
    } else if status >= 500 || status == 429 {
        Classification::Retryable
    } else {
        Classification::Terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportError;
    use rstest::rstest;

    #[rstest]
    #[case::ok(200, Classification::Success)]
    #[case::created(201, Classification::Success)]
    #[case::no_content(204, Classification::Success)]
    #[case::moved(301, Classification::Terminal)]
    #[case::not_modified(304, Classification::Terminal)]
    #[case::bad_request(400, Classification::Terminal)]
    #[case::forbidden(403, Classification::Terminal)]
    #[case::not_found(404, Classification::Terminal)]
    #[case::too_many_requests(429, Classification::Retryable)]
    #[case::last_client_error(499, Classification::Terminal)]
    #[case::internal(500, Classification::Retryable)]
    #[case::unavailable(503, Classification::Retryable)]
    #[case::gateway_timeout(504, Classification::Retryable)]
    fn status_thresholds(#[case] status: u16, #[case] expected: Classification) {
        assert_eq!(classify_status(status), expected);
        assert_eq!(classify(&DeliveryOutcome::Responded { status }), expected);
    }

    #[rstest]
    #[case::timeout(TransportError::Timeout("deadline".into()), Classification::Retryable)]
    #[case::refused(TransportError::Connect("refused".into()), Classification::Retryable)]
    #[case::reset(TransportError::Request("reset by peer".into()), Classification::Retryable)]
    #[case::bad_url(TransportError::Build("relative URL".into()), Classification::Terminal)]
    fn transport_failures(#[case] err: TransportError, #[case] expected: Classification) {
        assert_eq!(classify(&DeliveryOutcome::Failed(err)), expected);
    }
}
