//! 实例缓存
//!
//! 服务名 → 实例列表。列表本身不可变，每次更新整体替换，
//! 读者拿到的总是一份完整的快照。

use dashmap::DashMap;
use std::sync::Arc;

use crate::discovery::instance::ServiceInstance;

/// 共享的不可变实例列表
pub type InstanceList = Arc<Vec<ServiceInstance>>;

#[derive(Debug, Default)]
pub struct InstanceCache {
    entries: DashMap<String, InstanceList>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 读取缓存，不经过填充锁
    pub fn get(&self, service_name: &str) -> Option<InstanceList> {
        self.entries.get(service_name).map(|entry| entry.value().clone())
    }

    /// 整体替换服务的实例列表，返回写入的快照
    pub fn store(&self, service_name: &str, instances: Vec<ServiceInstance>) -> InstanceList {
        let list: InstanceList = Arc::new(instances);
        self.entries.insert(service_name.to_string(), list.clone());
        list
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.entries.contains_key(service_name)
    }

    pub fn service_names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
