//! Outcome model: what one delivery attempt observed, and its verdict.
//!
//! This module only defines shapes. Mapping an outcome to a verdict lives in
//! `app::classifier`; acting on the verdict lives in `domain::decision`.

use std::fmt;

use super::errors::TransportError;

/// Raw result of one delivery attempt.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The endpoint answered; the body has already been drained.
    Responded { status: u16 },

    /// No status code was obtained.
    Failed(TransportError),
}

impl DeliveryOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryOutcome::Responded { status } => Some(*status),
            DeliveryOutcome::Failed(_) => None,
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Responded { status } => write!(f, "status {status}"),
            DeliveryOutcome::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Verdict on an attempt.
///
/// - `Success`: delivered, the task is done.
/// - `Retryable`: transient failure, counts against the retry budget.
/// - `Terminal`: retrying cannot help, drop now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Success,
    Retryable,
    Terminal,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Success => "success",
            Classification::Retryable => "retryable",
            Classification::Terminal => "non-retryable",
        };
        f.write_str(s)
    }
}
