//! 服务实例定义
//!
//! 字段名与注册中心（Consul 健康查询接口）的 JSON 结构保持一致，
//! 未显式建模的字段原样保留在 `extra` 中。

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 节点维护模式检查 ID
pub const NODE_MAINTENANCE_CHECK: &str = "_node_maintenance";

/// 服务维护模式检查 ID 前缀
pub const SERVICE_MAINTENANCE_PREFIX: &str = "_service_maintenance:";

/// 服务实例（注册中心返回的服务记录）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ServiceInstance {
    /// 实例 ID
    #[serde(rename = "ID", default)]
    pub id: String,

    /// 服务名
    #[serde(rename = "Service", default)]
    pub service: String,

    /// 标签
    #[serde(rename = "Tags", default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    /// 服务地址
    #[serde(rename = "Address", default)]
    pub address: String,

    /// 服务端口
    #[serde(rename = "Port", default)]
    pub port: u16,

    /// 元数据
    #[serde(rename = "Meta", default, deserialize_with = "null_as_default")]
    pub meta: HashMap<String, String>,

    /// 其余字段，原样透传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceInstance {
    /// 创建新的服务实例
    pub fn new(
        id: impl Into<String>,
        service: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            id: id.into(),
            service: service.into(),
            address: address.into(),
            port,
            ..Default::default()
        }
    }

    /// 添加标签
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// 添加元数据
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// `host:port` 形式的地址
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// 转换为 HTTP URL
    pub fn to_http_url(&self) -> String {
        format!("http://{}", self.authority())
    }
}

/// 聚合健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Passing,
    Warning,
    Critical,
    Maintenance,
    /// 出现了无法识别的检查状态
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Passing => "passing",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
            HealthStatus::Maintenance => "maintenance",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个健康检查结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HealthCheckStatus {
    #[serde(rename = "CheckID", default)]
    pub check_id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    /// passing / warning / critical
    #[serde(rename = "Status", default)]
    pub status: String,

    #[serde(rename = "ServiceID", default)]
    pub service_id: String,

    #[serde(rename = "Output", default)]
    pub output: String,
}

impl HealthCheckStatus {
    pub fn new(check_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    fn is_maintenance(&self) -> bool {
        self.check_id == NODE_MAINTENANCE_CHECK
            || self.check_id.starts_with(SERVICE_MAINTENANCE_PREFIX)
    }
}

/// 带健康信息的服务条目（健康查询接口的单个元素）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ServiceEntry {
    #[serde(rename = "Node", default)]
    pub node: Value,

    #[serde(rename = "Service")]
    pub service: ServiceInstance,

    #[serde(rename = "Checks", default, deserialize_with = "null_as_default")]
    pub checks: Vec<HealthCheckStatus>,
}

impl ServiceEntry {
    pub fn new(service: ServiceInstance) -> Self {
        Self {
            node: Value::Null,
            service,
            checks: Vec::new(),
        }
    }

    /// 添加健康检查结果
    pub fn with_check(mut self, check: HealthCheckStatus) -> Self {
        self.checks.push(check);
        self
    }

    /// 计算聚合健康状态
    ///
    /// 维护模式优先，其次 critical、warning；全部通过或没有检查时为 passing。
    /// 任意一个检查状态无法识别时返回 `Unknown`。
    pub fn aggregated_status(&self) -> HealthStatus {
        let mut warning = false;
        let mut critical = false;
        let mut maintenance = false;

        for check in &self.checks {
            if check.is_maintenance() {
                maintenance = true;
                continue;
            }
            match check.status.as_str() {
                "passing" => {}
                "warning" => warning = true,
                "critical" => critical = true,
                _ => return HealthStatus::Unknown,
            }
        }

        if maintenance {
            HealthStatus::Maintenance
        } else if critical {
            HealthStatus::Critical
        } else if warning {
            HealthStatus::Warning
        } else {
            HealthStatus::Passing
        }
    }

    pub fn is_passing(&self) -> bool {
        self.aggregated_status() == HealthStatus::Passing
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
