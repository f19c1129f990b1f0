//! Domain model (payload, task, envelope, outcome, decision, errors).

pub mod decision;
pub mod envelope;
pub mod errors;
pub mod location;
pub mod outcome;
pub mod retry;
pub mod state;
pub mod task;

pub use self::decision::{Decision, DropReason, decide};
pub use self::envelope::{DeliveryEnvelope, RequestBody};
pub use self::errors::{ConfigError, EnqueueError, QueueError, TransportError};
pub use self::location::{DetectedIncident, LocationCheckResult};
pub use self::outcome::{Classification, DeliveryOutcome};
pub use self::retry::{DEFAULT_MAX_RETRIES, RetryPolicy};
pub use self::state::WorkerState;
pub use self::task::{HttpMethod, WebhookTask};
