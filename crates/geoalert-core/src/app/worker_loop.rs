//! WorkerLoop - 配送ループ
//!
//! # フロー
//! 1. DeliveryQueue::dequeue() で bounded wait（Waiting）
//! 2. DeliveryTransport::send() で 1 回送信（Delivering）
//! 3. classify() で判定、decide() で次の行動を決める
//! 4. requeue 前に必要なら backoff（Backoff）、その後 Waiting に戻る
//!
//! 単一の consumer がループ全体を回す。並列配送はしない。

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::classifier::classify;
use super::status::{DeliveryCounts, DeliveryStats};
use crate::domain::{
    Classification, Decision, DropReason, RetryPolicy, WebhookTask, WorkerState, decide,
};
use crate::ports::{DeliveryQueue, DeliveryTransport};

/// Bounded wait used for each dequeue when none is configured.
pub const DEFAULT_DEQUEUE_WAIT: Duration = Duration::from_secs(10);

/// Timing knobs of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// How long one dequeue may block.
    pub dequeue_wait: Duration,

    /// Pause after a dequeue that found nothing.
    pub idle_pause: Duration,

    /// Pause after the queue store failed.
    pub error_pause: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            dequeue_wait: DEFAULT_DEQUEUE_WAIT,
            idle_pause: Duration::from_millis(300),
            error_pause: Duration::from_millis(500),
        }
    }
}

/// The single background consumer of the delivery queue.
pub struct DeliveryWorker {
    queue: Arc<dyn DeliveryQueue>,
    transport: Arc<dyn DeliveryTransport>,
    policy: RetryPolicy,
    settings: WorkerSettings,
    stats: Arc<DeliveryStats>,
}

impl DeliveryWorker {
    pub fn new(
        queue: Arc<dyn DeliveryQueue>,
        transport: Arc<dyn DeliveryTransport>,
        policy: RetryPolicy,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            transport,
            policy,
            settings,
            stats: Arc::new(DeliveryStats::new()),
        }
    }

    /// Start the loop on the tokio runtime. It begins in `Waiting`.
    pub fn spawn(self) -> WorkerHandle {
        let token = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(WorkerState::Waiting);
        let stats = Arc::clone(&self.stats);

        let join = tokio::spawn(self.run(token.clone(), state_tx));

        WorkerHandle {
            token,
            state: state_rx,
            stats,
            join,
        }
    }

    /// Run until `token` is cancelled.
    pub async fn run(self, token: CancellationToken, state_tx: watch::Sender<WorkerState>) {
        info!(
            max_retries = self.policy.max_retries,
            backoff = self.policy.backoff,
            queue = self.queue.name(),
            "delivery worker started"
        );

        loop {
            // shutdown が来ていたら抜ける
            if token.is_cancelled() {
                break;
            }
            state_tx.send_replace(WorkerState::Waiting);

            // dequeue は最大 dequeue_wait 待つので cancel と競合させる
            let popped = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                popped = self.queue.dequeue(self.settings.dequeue_wait) => popped,
            };

            let task = match popped {
                Ok(Some(task)) => task,
                Ok(None) => {
                    pause(&token, self.settings.idle_pause).await;
                    continue;
                }
                Err(err) => {
                    // 何も pop していないので失われたタスクはない
                    self.stats.record_dequeue_error();
                    warn!(error = %err, "dequeue failed");
                    pause(&token, self.settings.error_pause).await;
                    continue;
                }
            };

            if self.process(task, &token, &state_tx).await.is_break() {
                break;
            }
        }

        state_tx.send_replace(WorkerState::Stopped);
        info!("cancellation received, delivery worker finished");
    }

    /// One task: deliver, classify, then drop / requeue / continue.
    async fn process(
        &self,
        mut task: WebhookTask,
        token: &CancellationToken,
        state_tx: &watch::Sender<WorkerState>,
    ) -> ControlFlow<()> {
        state_tx.send_replace(WorkerState::Delivering);
        debug!(
            check_id = task.check_id(),
            retry_count = task.retry_count(),
            method = %task.method(),
            url = task.url(),
            "delivering task"
        );

        self.stats.record_attempt();
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                // 送信を中断した試行は失敗として数えない
                warn!(check_id = task.check_id(), "delivery aborted by shutdown, putting task back");
                self.requeue(&task).await;
                return ControlFlow::Break(());
            }
            outcome = self.transport.send(&task) => outcome,
        };

        let classification = classify(&outcome);
        let decision = decide(classification, task.retry_count(), &self.policy);
        if classification == Classification::Retryable {
            task.record_retry();
        }

        match decision {
            Decision::Continue => {
                self.stats.record_delivered();
                info!(check_id = task.check_id(), outcome = %outcome, "webhook delivered");
            }
            Decision::Drop(DropReason::Terminal) => {
                self.stats.record_dropped_terminal();
                warn!(
                    check_id = task.check_id(),
                    outcome = %outcome,
                    retry_count = task.retry_count(),
                    "non-retryable delivery error, task dropped"
                );
            }
            Decision::Drop(DropReason::RetriesExhausted {
                retry_count,
                max_retries,
            }) => {
                self.stats.record_dropped_exhausted();
                error!(
                    severity = "critical",
                    check_id = task.check_id(),
                    user_id = %task.payload().user_id,
                    retry_count,
                    max_retries,
                    outcome = %outcome,
                    "max retries exceeded, task dropped"
                );
            }
            Decision::RequeueAfter(delay) => {
                warn!(
                    check_id = task.check_id(),
                    outcome = %outcome,
                    retry_count = task.retry_count(),
                    delay_ms = delay.as_millis() as u64,
                    "retryable delivery error, requeueing"
                );

                let mut cancelled = false;
                if !delay.is_zero() {
                    state_tx.send_replace(WorkerState::Backoff);
                    cancelled = tokio::select! {
                        _ = token.cancelled() => true,
                        _ = tokio::time::sleep(delay) => false,
                    };
                }

                // cancel されても retry_count を進めたタスクは戻しておく
                self.requeue(&task).await;
                if cancelled {
                    return ControlFlow::Break(());
                }
            }
        }

        ControlFlow::Continue(())
    }

    async fn requeue(&self, task: &WebhookTask) {
        match self.queue.requeue(task).await {
            Ok(()) => self.stats.record_requeued(),
            Err(err) => {
                self.stats.record_requeue_failure();
                error!(
                    check_id = task.check_id(),
                    retry_count = task.retry_count(),
                    error = %err,
                    "failed to requeue task, task lost"
                );
            }
        }
    }
}

async fn pause(token: &CancellationToken, duration: Duration) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(duration) => {}
    }
}

/// Handle to the running worker.
/// - `stop()` で cancel を通知（以降 dequeue しない）
/// - `shutdown()` で停止を待つ
pub struct WorkerHandle {
    token: CancellationToken,
    state: watch::Receiver<WorkerState>,
    stats: Arc<DeliveryStats>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal cancellation. An in-flight HTTP call is aborted, not awaited.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    pub fn stats(&self) -> DeliveryCounts {
        self.stats.snapshot()
    }

    /// Stop, wait for the loop to exit and return the final counters.
    pub async fn shutdown(self) -> DeliveryCounts {
        self.stop();
        if let Err(err) = self.join.await {
            error!(error = %err, "delivery worker task failed");
        }
        self.stats.snapshot()
    }
}
