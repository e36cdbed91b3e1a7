//! 注册中心后端抽象

pub mod consul;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::discovery::instance::ServiceEntry;
use crate::error::Result;
use crate::registry::Registration;

/// 监听事件的载荷
///
/// 在订阅边界上把注册中心返回的原始数据归类，`Malformed` 总是被丢弃。
#[derive(Debug, Clone, PartialEq)]
pub enum WatchPayload {
    /// 没有数据
    Empty,
    /// 带健康信息的实例列表
    InstanceList(Vec<ServiceEntry>),
    /// 无法解析为实例列表
    Malformed,
}

impl WatchPayload {
    /// 从 JSON 值归类
    pub fn from_json(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => WatchPayload::Empty,
            Some(value) => match serde_json::from_value::<Vec<ServiceEntry>>(value) {
                Ok(entries) => WatchPayload::InstanceList(entries),
                Err(_) => WatchPayload::Malformed,
            },
        }
    }

    /// 从原始响应体归类
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return WatchPayload::Empty;
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_json(Some(value)),
            Err(_) => WatchPayload::Malformed,
        }
    }
}

/// 监听事件：注册中心的变更序号和对应的全量快照
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    pub index: u64,
    pub payload: WatchPayload,
}

impl WatchEvent {
    pub fn new(index: u64, payload: WatchPayload) -> Self {
        Self { index, payload }
    }
}

/// 注册中心后端 trait
///
/// 注册/注销、同步查询与长连接监听。需要动态分发，使用 async-trait。
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// 注册服务实例
    async fn register(&self, registration: &Registration) -> Result<()>;

    /// 注销服务实例
    async fn deregister(&self, instance_id: &str) -> Result<()>;

    /// 查询服务当前的实例列表
    async fn query_instances(&self, service_name: &str) -> Result<Vec<ServiceEntry>>;

    /// 监听服务变化
    ///
    /// 每次变化推送一个全量快照；接收端被丢弃后，后端应停止监听。
    async fn watch(&self, service_name: &str) -> Result<mpsc::Receiver<WatchEvent>>;
}
