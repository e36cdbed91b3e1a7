//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{RegistryError, Result};

/// 安装全局 tracing subscriber
///
/// 优先使用 `RUST_LOG`，未设置时回退到配置中的级别。
/// 重复调用会返回错误（全局 subscriber 只能设置一次）。
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| RegistryError::config(format!("Invalid log level {}: {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| RegistryError::config(format!("Failed to install tracing subscriber: {}", e)))
}
