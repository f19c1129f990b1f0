use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use geoalert_core::app::{HealthChecker, QueueProbe, TaskProducer, WebhookManager};
use geoalert_core::config::AppConfig;
use geoalert_core::domain::LocationCheckResult;
use geoalert_core::impls::RedisDeliveryQueue;
use geoalert_core::observability;
use geoalert_core::ports::DeliveryQueue;

const USAGE: &str = "usage: geoalert [run | enqueue <location-check-json> [url] [method] | depth | health]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    observability::init(config.log_format);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("run");

    let queue = RedisDeliveryQueue::connect_with_key(&config.redis.url(), &config.redis.queue_key)
        .await
        .with_context(|| format!("failed to connect to redis at {}", config.redis.addr))?;
    let queue: Arc<dyn DeliveryQueue> = Arc::new(queue);

    match command {
        "run" => run(&config, queue).await,
        "enqueue" => {
            let Some(raw) = args.get(1) else {
                bail!("{USAGE}");
            };
            enqueue(&config, queue, raw, args.get(2), args.get(3)).await
        }
        "depth" => {
            let depth = queue.depth().await?;
            println!("{depth}");
            Ok(())
        }
        "health" => {
            let report = health(queue).check().await;
            println!("{}", serde_json::to_string(&report)?);
            if !report.is_healthy() {
                bail!("queue is unhealthy");
            }
            Ok(())
        }
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }
}

/// 1) worker を起動 2) Ctrl-C まで待つ 3) shutdown
async fn run(config: &AppConfig, queue: Arc<dyn DeliveryQueue>) -> Result<()> {
    let report = health(Arc::clone(&queue)).check().await;
    if report.is_healthy() {
        info!(status = %report.server_status, "dependencies healthy");
    } else {
        warn!(errors = ?report.errors, "starting with unhealthy dependencies");
    }

    let manager = WebhookManager::with_http(&config.webhook, queue)?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    let stats = manager.shutdown().await;
    info!(
        attempts = stats.attempts,
        delivered = stats.delivered,
        requeued = stats.requeued,
        dropped = stats.dropped_terminal + stats.dropped_exhausted,
        "bye"
    );
    Ok(())
}

async fn enqueue(
    config: &AppConfig,
    queue: Arc<dyn DeliveryQueue>,
    raw: &str,
    url: Option<&String>,
    method: Option<&String>,
) -> Result<()> {
    let result: LocationCheckResult =
        serde_json::from_str(raw).context("argument is not a location check result")?;

    let producer = TaskProducer::new(
        queue,
        config.webhook.default_url.clone(),
        config.webhook.default_method,
    );
    producer
        .enqueue(result, url.map(String::as_str), method.map(String::as_str))
        .await?;
    Ok(())
}

fn health(queue: Arc<dyn DeliveryQueue>) -> HealthChecker {
    HealthChecker::new().with_probe(Arc::new(QueueProbe(queue)))
}
