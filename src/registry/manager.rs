//! 注册管理器
//!
//! 生成实例身份、构建注册记录并调用后端完成注册/注销。

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::record::{Registration, generate_instance_id};
use crate::discovery::backend::RegistryBackend;
use crate::types::ServiceInfo;

/// 注册管理器
///
/// 持有本客户端唯一的注册身份。注册/注销应由同一个控制任务调用。
pub struct RegistrationManager {
    backend: Arc<dyn RegistryBackend>,
    service_info: RwLock<Option<ServiceInfo>>,
}

impl RegistrationManager {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self {
            backend,
            service_info: RwLock::new(None),
        }
    }

    /// 注册服务
    ///
    /// 成功时保存新的身份（覆盖旧身份）并返回 true；
    /// 后端失败时返回 false，已持有的身份保持不变。
    pub async fn register(
        &self,
        service_name: &str,
        host: &str,
        port: u16,
        meta: HashMap<String, String>,
        health_path: &str,
    ) -> bool {
        let instance_id = generate_instance_id(service_name);
        let service_info = ServiceInfo::new(service_name, host, port, instance_id);
        let registration = Registration::for_service(&service_info, meta, health_path);

        match self.backend.register(&registration).await {
            Ok(()) => {
                info!(
                    service = %service_name,
                    instance_id = %service_info.instance_id,
                    address = %format!("{}:{}", host, port),
                    "Register service success"
                );
                *self.service_info.write().await = Some(service_info);
                true
            }
            Err(e) => {
                error!(service = %service_name, error = %e, "Register service error");
                false
            }
        }
    }

    /// 注销服务
    ///
    /// 未注册过时直接返回 false，不调用后端。注销后身份不会被清除，
    /// 再次调用会以同一个实例 ID 重新注销。
    pub async fn deregister(&self) -> bool {
        let instance_id = match self.service_info.read().await.as_ref() {
            Some(info) if !info.instance_id.is_empty() => info.instance_id.clone(),
            _ => {
                debug!("DeRegister skipped: no service registered");
                return false;
            }
        };

        match self.backend.deregister(&instance_id).await {
            Ok(()) => {
                info!(instance_id = %instance_id, "DeRegister service success");
                true
            }
            Err(e) => {
                error!(instance_id = %instance_id, error = %e, "DeRegister service error");
                false
            }
        }
    }

    pub async fn service_info(&self) -> Option<ServiceInfo> {
        self.service_info.read().await.clone()
    }

    /// 已注册服务的服务名
    pub async fn service_name(&self) -> Option<String> {
        self.service_info
            .read()
            .await
            .as_ref()
            .map(|info| info.service_name.clone())
            .filter(|name| !name.is_empty())
    }
}
