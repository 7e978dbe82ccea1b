//! ロギング初期化ユーティリティ
//!
//! `RUST_LOG`が設定されていればそれを優先し、無ければ
//! `BOTSTATUS_LOG_LEVEL`（旧: `LOG_LEVEL`、デフォルト: `info`）を使う。

use crate::config::get_env_with_fallback_or;
use tracing_subscriber::EnvFilter;

/// Default filter directive when nothing is configured
const DEFAULT_LOG_LEVEL: &str = "info";

/// Build the filter used by [`init`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = get_env_with_fallback_or("BOTSTATUS_LOG_LEVEL", "LOG_LEVEL", DEFAULT_LOG_LEVEL);
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    })
}

/// Install the global tracing subscriber.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .try_init()
}
