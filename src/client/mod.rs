//! 注册中心客户端
//!
//! 组合注册管理器与服务解析器，提供注册、注销和服务发现的统一入口。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, RegistryConfig, ServiceConfig};
use crate::discovery::backend::RegistryBackend;
use crate::discovery::backend::consul::ConsulBackend;
use crate::discovery::cache::{InstanceCache, InstanceList};
use crate::discovery::resolver::ServiceResolver;
use crate::discovery::watch::SubscriptionState;
use crate::error::Result;
use crate::registry::RegistrationManager;
use crate::types::ServiceInfo;

/// 客户端构建器（Consul 后端）
pub struct ClientBuilder {
    config: RegistryConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn passing_only(mut self, passing_only: bool) -> Self {
        self.config.passing_only = passing_only;
        self
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.config.wait = wait;
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let backend = ConsulBackend::new(&self.config)?;
        Ok(RegistryClient::new(Arc::new(backend)))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 注册中心客户端
pub struct RegistryClient {
    registration: RegistrationManager,
    resolver: ServiceResolver,
}

impl RegistryClient {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self {
            registration: RegistrationManager::new(backend.clone()),
            resolver: ServiceResolver::new(backend),
        }
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// 根据配置创建 Consul 客户端
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = ConsulBackend::new(&config.registry)?;
        Ok(Self::new(Arc::new(backend)))
    }

    /// 注册服务
    pub async fn register(
        &self,
        service_name: &str,
        host: &str,
        port: u16,
        meta: HashMap<String, String>,
        health_path: &str,
    ) -> bool {
        self.registration
            .register(service_name, host, port, meta, health_path)
            .await
    }

    /// 使用配置中的 `[service]` 注册
    pub async fn register_from_config(&self, service: &ServiceConfig) -> bool {
        self.register(
            &service.name,
            &service.host,
            service.port,
            service.meta.clone(),
            &service.health_path,
        )
        .await
    }

    /// 注销本客户端注册的服务
    pub async fn deregister(&self) -> bool {
        self.registration.deregister().await
    }

    /// 获取服务实例列表
    ///
    /// `service_name` 为 `None` 时使用本客户端注册的服务名；
    /// 没有可用的服务名时返回空列表。仅在首次填充的同步查询失败时返回 `None`。
    pub async fn discover_services(&self, service_name: Option<&str>) -> Option<InstanceList> {
        let service_name = match service_name {
            Some(name) => name.to_string(),
            None => match self.registration.service_name().await {
                Some(name) => name,
                None => return Some(Arc::new(Vec::new())),
            },
        };

        self.resolver.resolve(&service_name).await
    }

    pub async fn service_info(&self) -> Option<ServiceInfo> {
        self.registration.service_info().await
    }

    pub fn cache(&self) -> &InstanceCache {
        self.resolver.cache()
    }

    pub fn subscription_state(&self, service_name: &str) -> SubscriptionState {
        self.resolver.subscription_state(service_name)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.resolver.active_subscriptions()
    }

    /// 停止所有后台订阅
    pub async fn shutdown(&self) {
        self.resolver.shutdown().await;
    }
}
