//! Observability - tracing の初期化
//!
//! `RUST_LOG` でフィルタ（未設定なら `info`）。出力形式は `LOG_FORMAT` で選ぶ。

use std::fmt;
use std::str::FromStr;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::domain::ConfigError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for local runs.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid {
                key: "LOG_FORMAT".to_string(),
                reason: format!("expected json or pretty, got {other:?}"),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    // 2 回目以降は既存の subscriber がそのまま使われる
    if let Err(err) = installed {
        debug!(error = %err, "global subscriber already installed, keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("JSON", LogFormat::Json)]
    #[case("pretty", LogFormat::Pretty)]
    #[case(" text ", LogFormat::Pretty)]
    fn test_parse(#[case] raw: &str, #[case] expected: LogFormat) {
        assert_eq!(raw.parse::<LogFormat>().unwrap(), expected);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(LogFormat::Pretty);
        init(LogFormat::Json);
        assert!(tracing::dispatcher::has_been_set());
    }
}
