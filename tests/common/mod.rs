//! 测试用的内存注册中心后端

#![allow(dead_code)]

use async_trait::async_trait;
use flare_registry_client::{
    HealthCheckStatus, Registration, RegistryBackend, RegistryError, Result, ServiceEntry,
    ServiceInstance, WatchEvent, WatchPayload,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

/// 可编程的内存后端，记录所有调用
#[derive(Default)]
pub struct FakeBackend {
    pub registrations: Mutex<Vec<Registration>>,
    pub deregistrations: Mutex<Vec<String>>,
    pub query_calls: AtomicUsize,
    pub watch_calls: AtomicUsize,
    pub fail_register: AtomicBool,
    pub fail_deregister: AtomicBool,
    pub fail_query: AtomicBool,
    query_results: Mutex<HashMap<String, Vec<ServiceEntry>>>,
    query_delay: Mutex<Duration>,
    watchers: Mutex<HashMap<String, mpsc::Sender<WatchEvent>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_instances(&self, service_name: &str, entries: Vec<ServiceEntry>) {
        self.query_results
            .lock()
            .unwrap()
            .insert(service_name.to_string(), entries);
    }

    /// 同步查询的人为延迟，用于放大并发窗口
    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = delay;
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().unwrap().len()
    }

    /// 等待订阅任务调用 watch
    pub async fn wait_for_watch(&self, service_name: &str) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !self.watchers.lock().unwrap().contains_key(service_name) {
            assert!(Instant::now() < deadline, "watch for {} never started", service_name);
            sleep(Duration::from_millis(5)).await;
        }
    }

    /// 向服务的监听通道推送事件
    pub async fn push(&self, service_name: &str, event: WatchEvent) {
        let sender = self
            .watchers
            .lock()
            .unwrap()
            .get(service_name)
            .cloned()
            .expect("no watcher for service");
        sender.send(event).await.expect("subscription gone");
    }

    /// 监听通道的接收端是否已关闭
    pub fn watch_closed(&self, service_name: &str) -> bool {
        self.watchers
            .lock()
            .unwrap()
            .get(service_name)
            .map(|tx| tx.is_closed())
            .unwrap_or(true)
    }
}

#[async_trait]
impl RegistryBackend for FakeBackend {
    async fn register(&self, registration: &Registration) -> Result<()> {
        self.registrations.lock().unwrap().push(registration.clone());
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(RegistryError::status(500, "register rejected"));
        }
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<()> {
        self.deregistrations
            .lock()
            .unwrap()
            .push(instance_id.to_string());
        if self.fail_deregister.load(Ordering::SeqCst) {
            return Err(RegistryError::status(500, "deregister rejected"));
        }
        Ok(())
    }

    async fn query_instances(&self, service_name: &str) -> Result<Vec<ServiceEntry>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.query_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(RegistryError::status(503, "registry unavailable"));
        }
        Ok(self
            .query_results
            .lock()
            .unwrap()
            .get(service_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn watch(&self, service_name: &str) -> Result<mpsc::Receiver<WatchEvent>> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        self.watchers
            .lock()
            .unwrap()
            .insert(service_name.to_string(), tx);
        Ok(rx)
    }
}

pub fn instance(service: &str, id: &str, port: u16) -> ServiceInstance {
    ServiceInstance::new(id, service, "10.0.0.1", port)
}

pub fn entry(service: &str, id: &str, port: u16, status: &str) -> ServiceEntry {
    ServiceEntry::new(instance(service, id, port))
        .with_check(HealthCheckStatus::new("serfHealth", "passing"))
        .with_check(HealthCheckStatus::new(format!("service:{}", id), status))
}

pub fn list_event(index: u64, entries: Vec<ServiceEntry>) -> WatchEvent {
    WatchEvent::new(index, WatchPayload::InstanceList(entries))
}

/// 轮询直到条件满足或超时
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(5)).await;
    }
}
