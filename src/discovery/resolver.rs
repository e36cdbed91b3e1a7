//! 服务解析
//!
//! 缓存命中直接返回；未命中时在全局填充锁下二次检查，
//! 启动订阅并同步查询一次注册中心填充缓存。

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::discovery::backend::RegistryBackend;
use crate::discovery::cache::{InstanceCache, InstanceList};
use crate::discovery::instance::ServiceInstance;
use crate::discovery::watch::{SubscriptionState, WatchCoordinator};

/// 服务解析器
pub struct ServiceResolver {
    backend: Arc<dyn RegistryBackend>,
    cache: Arc<InstanceCache>,
    coordinator: WatchCoordinator,
    /// 所有服务名共用的填充锁，只在缓存未命中时获取
    populate_lock: Mutex<()>,
}

impl ServiceResolver {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        let cache = Arc::new(InstanceCache::new());
        Self {
            coordinator: WatchCoordinator::new(backend.clone(), cache.clone()),
            backend,
            cache,
            populate_lock: Mutex::new(()),
        }
    }

    /// 解析服务实例列表
    ///
    /// 同步查询失败时缓存空列表并返回 `None`；之后的调用命中缓存，
    /// 由订阅负责后续更新。同步查询结果与订阅首个事件之间没有先后约束，
    /// 以最后一次写入为准。
    pub async fn resolve(&self, service_name: &str) -> Option<InstanceList> {
        if service_name.is_empty() {
            return Some(Arc::new(Vec::new()));
        }

        if let Some(instances) = self.cache.get(service_name) {
            return Some(instances);
        }

        let _guard = self.populate_lock.lock().await;

        // 等锁期间可能已被其他调用方填充
        if let Some(instances) = self.cache.get(service_name) {
            debug!(service = %service_name, "Cache populated while waiting for lock");
            return Some(instances);
        }

        self.coordinator.ensure_started(service_name);
        self.seed(service_name).await
    }

    async fn seed(&self, service_name: &str) -> Option<InstanceList> {
        match self.backend.query_instances(service_name).await {
            Ok(entries) => {
                let instances: Vec<ServiceInstance> =
                    entries.into_iter().map(|entry| entry.service).collect();
                debug!(service = %service_name, count = instances.len(), "Cache seeded");
                Some(self.cache.store(service_name, instances))
            }
            Err(e) => {
                error!(service = %service_name, error = %e, "Discover service error");
                self.cache.store(service_name, Vec::new());
                None
            }
        }
    }

    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    pub fn subscription_state(&self, service_name: &str) -> SubscriptionState {
        self.coordinator.state(service_name)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.coordinator.active_count()
    }

    /// 停止所有订阅，缓存保留最后的数据
    pub async fn shutdown(&self) {
        self.coordinator.shutdown().await;
    }
}
