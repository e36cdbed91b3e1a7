//! 注册记录构建

use std::collections::HashMap;
use std::time::Duration;

use crate::types::ServiceInfo;

/// 健康检查间隔
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// 检查持续失败多久后自动注销
pub const DEREGISTER_CRITICAL_AFTER: Duration = Duration::from_secs(30);

/// 生成实例 ID：`<service_name>-<uuid v4>`
pub fn generate_instance_id(service_name: &str) -> String {
    format!("{}-{}", service_name, uuid::Uuid::new_v4())
}

/// HTTP 健康检查描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSpec {
    pub http: String,
    pub interval: Duration,
    pub deregister_critical_service_after: Duration,
}

impl HealthCheckSpec {
    /// 由实例地址和健康检查路径组合出检查 URL
    pub fn http(host: &str, port: u16, health_path: &str) -> Self {
        Self {
            http: format!("http://{}:{}{}", host, port, health_path),
            interval: HEALTH_CHECK_INTERVAL,
            deregister_critical_service_after: DEREGISTER_CRITICAL_AFTER,
        }
    }
}

/// 提交给注册中心的注册记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub meta: HashMap<String, String>,
    pub check: HealthCheckSpec,
}

impl Registration {
    pub fn for_service(
        info: &ServiceInfo,
        meta: HashMap<String, String>,
        health_path: &str,
    ) -> Self {
        Self {
            id: info.instance_id.clone(),
            name: info.service_name.clone(),
            address: info.service_host.clone(),
            port: info.service_port,
            meta,
            check: HealthCheckSpec::http(&info.service_host, info.service_port, health_path),
        }
    }
}
