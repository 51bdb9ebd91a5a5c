use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// 安装全局 tracing subscriber。`RUST_LOG` 优先，其次是配置中的 level。
pub fn init(config: &LogConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
