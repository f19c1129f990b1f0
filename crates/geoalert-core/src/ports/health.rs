//! HealthCheck port - 依存先の生存確認

use async_trait::async_trait;

/// A named dependency that can be pinged.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    /// `Err` carries a human-readable reason.
    async fn ping(&self) -> Result<(), String>;
}
