//! 订阅协调器
//!
//! 每个服务名最多一个后台订阅任务，把注册中心推送的变化写入实例缓存。

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::discovery::backend::{RegistryBackend, WatchEvent, WatchPayload};
use crate::discovery::cache::InstanceCache;
use crate::discovery::instance::ServiceInstance;

/// 单个服务名的订阅状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    NotStarted,
    Running,
}

/// 后台订阅任务句柄
///
/// 丢弃句柄会关闭停止信号，任务随之退出。
struct Subscription {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Subscription {
    fn stop(self) -> JoinHandle<()> {
        let _ = self.stop_tx.send(());
        self.handle
    }
}

/// 订阅协调器
pub struct WatchCoordinator {
    backend: Arc<dyn RegistryBackend>,
    cache: Arc<InstanceCache>,
    subscriptions: DashMap<String, Subscription>,
}

impl WatchCoordinator {
    pub fn new(backend: Arc<dyn RegistryBackend>, cache: Arc<InstanceCache>) -> Self {
        Self {
            backend,
            cache,
            subscriptions: DashMap::new(),
        }
    }

    /// 确保服务名的订阅已启动
    ///
    /// 返回 true 表示本次调用启动了新的订阅。启动后立即返回，
    /// 订阅任务独立运行，直到 [`shutdown`](Self::shutdown)。
    pub fn ensure_started(&self, service_name: &str) -> bool {
        match self.subscriptions.entry(service_name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                let (stop_tx, stop_rx) = oneshot::channel();
                let handle = tokio::spawn(run_subscription(
                    self.backend.clone(),
                    self.cache.clone(),
                    service_name.to_string(),
                    stop_rx,
                ));
                entry.insert(Subscription { stop_tx, handle });
                info!(service = %service_name, "Subscription started");
                true
            }
        }
    }

    pub fn state(&self, service_name: &str) -> SubscriptionState {
        if self.subscriptions.contains_key(service_name) {
            SubscriptionState::Running
        } else {
            SubscriptionState::NotStarted
        }
    }

    /// 已启动的订阅数量
    pub fn active_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// 停止所有订阅并等待任务退出
    pub async fn shutdown(&self) {
        let names: Vec<String> = self
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let handles: Vec<JoinHandle<()>> = names
            .iter()
            .filter_map(|name| self.subscriptions.remove(name))
            .map(|(_, subscription)| subscription.stop())
            .collect();

        let stopped = handles.len();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Subscription task ended abnormally");
            }
        }
        info!(stopped, "All subscriptions stopped");
    }
}

async fn run_subscription(
    backend: Arc<dyn RegistryBackend>,
    cache: Arc<InstanceCache>,
    service_name: String,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut events: mpsc::Receiver<WatchEvent> = tokio::select! {
        _ = &mut stop_rx => return,
        watched = backend.watch(&service_name) => match watched {
            Ok(events) => events,
            Err(e) => {
                warn!(service = %service_name, error = %e, "Failed to start watch");
                return;
            }
        },
    };

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!(service = %service_name, "Subscription stopped");
                break;
            }
            event = events.recv() => match event {
                Some(event) => apply_watch_event(&cache, &service_name, event),
                None => {
                    warn!(service = %service_name, "Watch stream closed by backend");
                    break;
                }
            },
        }
    }
}

/// 把一次监听事件写入缓存
pub(crate) fn apply_watch_event(cache: &InstanceCache, service_name: &str, event: WatchEvent) {
    let entries = match event.payload {
        WatchPayload::Empty => return,
        WatchPayload::Malformed => {
            debug!(service = %service_name, index = event.index, "Discarding malformed watch payload");
            return;
        }
        WatchPayload::InstanceList(entries) => entries,
    };

    // 没有实例在线
    if entries.is_empty() {
        cache.store(service_name, Vec::new());
        return;
    }

    let healthy: Vec<ServiceInstance> = entries
        .into_iter()
        .filter(|entry| entry.is_passing())
        .map(|entry| entry.service)
        .collect();

    debug!(
        service = %service_name,
        index = event.index,
        healthy = healthy.len(),
        "Watch update applied"
    );
    cache.store(service_name, healthy);
}
