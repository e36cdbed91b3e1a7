use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    pub service: Option<ServiceConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 注册中心连接配置
///
/// 时间类字段在 TOML 中以秒表示，允许小数（如 `retry_interval_secs = 0.25`）。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// 注册中心地址，如 http://127.0.0.1:8500
    #[serde(default = "default_registry_address")]
    pub address: String,
    /// 同步查询是否只返回健康实例
    #[serde(default)]
    pub passing_only: bool,
    /// 阻塞查询的最长等待时间
    #[serde(rename = "wait_secs", default = "default_wait", with = "duration_secs")]
    pub wait: Duration,
    /// 监听请求失败后的重试间隔
    #[serde(
        rename = "retry_interval_secs",
        default = "default_retry_interval",
        with = "duration_secs"
    )]
    pub retry_interval: Duration,
    /// 非阻塞请求的超时时间
    #[serde(
        rename = "request_timeout_secs",
        default = "default_request_timeout",
        with = "duration_secs"
    )]
    pub request_timeout: Duration,
}

fn default_registry_address() -> String {
    "http://127.0.0.1:8500".to_string()
}

fn default_wait() -> Duration {
    Duration::from_secs(10)
}

fn default_retry_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: default_registry_address(),
            passing_only: false,
            wait: default_wait(),
            retry_interval: default_retry_interval(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// 秒数（整数或小数）与 `Duration` 互转
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

/// 本服务的注册参数
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

fn default_health_path() -> String {
    "/health".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// RUST_LOG 未设置时使用的过滤级别
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
