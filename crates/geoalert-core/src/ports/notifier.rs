//! DangerNotifier port - incident service から見た producer の契約

use async_trait::async_trait;

use crate::domain::{EnqueueError, LocationCheckResult};

/// DangerNotifier は危険判定された location check を配送キューに積む
///
/// - `is_danger == false` は同期的に拒否（キューには触れない）
/// - `url` が空、`method` が GET/POST 以外なら設定のデフォルトを使う
/// - enqueue 以降の結果は呼び出し側に返らない（ログでのみ観測可能）
#[async_trait]
pub trait DangerNotifier: Send + Sync {
    async fn notify(
        &self,
        result: LocationCheckResult,
        url: Option<&str>,
        method: Option<&str>,
    ) -> Result<(), EnqueueError>;
}
