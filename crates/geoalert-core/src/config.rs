//! Config - 環境変数からの設定読み込み
//!
//! # 正規化
//! - 空・不正な値はデフォルトに置き換え、`warn!` を出す（起動は止めない）
//! - `QUEUE_POP_WAIT_SECS` だけは 0 を許さない（BLPOP の 0 は無期限待ちになる）
//!
//! 読み込みは `from_lookup` に関数を渡して行うので、テストは環境変数を書き換えない。

use std::time::Duration;

use tracing::warn;

use crate::app::WorkerSettings;
use crate::domain::{ConfigError, DEFAULT_MAX_RETRIES, HttpMethod, RetryPolicy};
use crate::impls::{DEFAULT_QUEUE_KEY, DEFAULT_REQUEST_TIMEOUT};
use crate::observability::LogFormat;

pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:9090";
pub const DEFAULT_REDIS_ADDR: &str = "localhost:6379";
const DEFAULT_POP_WAIT_SECS: u64 = 10;

/// Delivery settings: default target, retry budget and timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub default_url: String,
    pub default_method: HttpMethod,
    pub max_retries: u32,
    pub backoff: bool,
    pub request_timeout: Duration,
    pub dequeue_wait: Duration,
    pub idle_pause: Duration,
    pub error_pause: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        let settings = WorkerSettings::default();
        Self {
            default_url: DEFAULT_WEBHOOK_URL.to_string(),
            default_method: HttpMethod::Post,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            dequeue_wait: settings.dequeue_wait,
            idle_pause: settings.idle_pause,
            error_pause: settings.error_pause,
        }
    }
}

impl WebhookConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            dequeue_wait: self.dequeue_wait,
            idle_pause: self.idle_pause,
            error_pause: self.error_pause,
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_url = match non_empty(&lookup, "WEBHOOK_URL") {
            Some(url) => url,
            None => {
                warn!(default = DEFAULT_WEBHOOK_URL, "WEBHOOK_URL is empty, using default");
                defaults.default_url
            }
        };

        let default_method = match non_empty(&lookup, "WEBHOOK_METHOD") {
            None => HttpMethod::Post,
            Some(raw) => HttpMethod::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "WEBHOOK_METHOD must be GET or POST, using POST");
                HttpMethod::Post
            }),
        };

        let max_retries = match non_empty(&lookup, "WEBHOOK_MAX_RETRY") {
            None => DEFAULT_MAX_RETRIES,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
                _ => {
                    warn!(
                        value = %raw,
                        default = DEFAULT_MAX_RETRIES,
                        "WEBHOOK_MAX_RETRY must be a positive integer, using default"
                    );
                    DEFAULT_MAX_RETRIES
                }
            },
        };

        let backoff = match non_empty(&lookup, "WEBHOOK_BACKOFF") {
            None => defaults.backoff,
            Some(raw) => parse_bool("WEBHOOK_BACKOFF", &raw)?,
        };

        let request_timeout = match non_empty(&lookup, "WEBHOOK_TIMEOUT_MS") {
            None => defaults.request_timeout,
            Some(raw) => Duration::from_millis(parse_positive("WEBHOOK_TIMEOUT_MS", &raw)?),
        };

        let dequeue_wait = match non_empty(&lookup, "QUEUE_POP_WAIT_SECS") {
            None => Duration::from_secs(DEFAULT_POP_WAIT_SECS),
            Some(raw) => Duration::from_secs(parse_positive("QUEUE_POP_WAIT_SECS", &raw)?),
        };

        Ok(Self {
            default_url,
            default_method,
            max_retries,
            backoff,
            request_timeout,
            dequeue_wait,
            ..defaults
        })
    }
}

/// Where the queue lives.
#[derive(Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub addr: String,
    pub password: Option<String>,
    pub queue_key: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_REDIS_ADDR.to_string(),
            password: None,
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
        }
    }
}

// password は出さない
impl std::fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConfig")
            .field("addr", &self.addr)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("queue_key", &self.queue_key)
            .finish()
    }
}

impl RedisConfig {
    /// `redis://` connection URL for the client.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{password}@{}", self.addr),
            None => format!("redis://{}", self.addr),
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            addr: non_empty(&lookup, "REDIS_ADDR").unwrap_or(defaults.addr),
            password: non_empty(&lookup, "REDIS_PASSWORD"),
            queue_key: defaults.queue_key,
        }
    }
}

/// Everything the process needs at startup.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub webhook: WebhookConfig,
    pub redis: RedisConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_format = match non_empty(&lookup, "LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw.parse()?,
        };

        Ok(Self {
            webhook: WebhookConfig::from_lookup(&lookup)?,
            redis: RedisConfig::from_lookup(&lookup),
            log_format,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("expected a boolean, got {raw:?}"),
        }),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("expected a positive integer, got {raw:?}"),
        }),
    }
}
