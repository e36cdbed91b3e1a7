use serde::{Deserialize, Serialize};

/// 本客户端注册的服务实例身份
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service_name: String,
    pub service_host: String,
    pub service_port: u16,
    pub instance_id: String,
}

impl ServiceInfo {
    pub fn new(
        service_name: impl Into<String>,
        service_host: impl Into<String>,
        service_port: u16,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_host: service_host.into(),
            service_port,
            instance_id: instance_id.into(),
        }
    }
}
