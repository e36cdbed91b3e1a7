//! 注册中心客户端错误处理模块
//!
//! 后端调用和配置加载的统一错误类型

use thiserror::Error;

/// 注册中心客户端错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    /// HTTP 请求失败（连接失败、超时等）
    #[error("请求注册中心失败: {0}")]
    Request(#[from] reqwest::Error),

    /// 注册中心返回非 2xx 状态码
    #[error("注册中心返回错误状态 {status}: {body}")]
    Status { status: u16, body: String },

    /// 响应体解析失败
    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析错误
    #[error("TOML 解析失败: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RegistryError {
    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        RegistryError::Config(msg.into())
    }

    /// 创建状态码错误
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        RegistryError::Status {
            status,
            body: body.into(),
        }
    }

    /// 是否为后端不可达类错误（连接失败、超时）
    pub fn is_unreachable(&self) -> bool {
        match self {
            RegistryError::Request(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// 注册中心客户端结果类型
pub type Result<T> = std::result::Result<T, RegistryError>;
