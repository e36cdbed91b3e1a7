//! Consul 注册中心后端

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, Url};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{RegistryBackend, WatchEvent, WatchPayload};
use crate::config::RegistryConfig;
use crate::discovery::instance::ServiceEntry;
use crate::error::{RegistryError, Result};
use crate::registry::Registration;

const CONSUL_INDEX_HEADER: &str = "X-Consul-Index";

/// 监听重试间隔下限
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Consul 注册中心后端
#[derive(Clone)]
pub struct ConsulBackend {
    http_client: HttpClient,
    base_url: Url,
    /// 同步查询是否附带 passing=true
    passing_only: bool,
    wait: Duration,
    retry_interval: Duration,
    request_timeout: Duration,
}

#[allow(non_snake_case)]
#[derive(Serialize)]
struct ConsulServiceRegistration<'a> {
    ID: &'a str,
    Name: &'a str,
    Address: &'a str,
    Port: u16,
    Meta: &'a HashMap<String, String>,
    Check: ConsulCheck<'a>,
}

#[allow(non_snake_case)]
#[derive(Serialize)]
struct ConsulCheck<'a> {
    HTTP: &'a str,
    Interval: String,
    DeregisterCriticalServiceAfter: String,
}

impl<'a> From<&'a Registration> for ConsulServiceRegistration<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            ID: &registration.id,
            Name: &registration.name,
            Address: &registration.address,
            Port: registration.port,
            Meta: &registration.meta,
            Check: ConsulCheck {
                HTTP: &registration.check.http,
                Interval: duration_string(registration.check.interval),
                DeregisterCriticalServiceAfter: duration_string(
                    registration.check.deregister_critical_service_after,
                ),
            },
        }
    }
}

/// Consul 时长格式：整秒写作 `15s`，否则写作毫秒
fn duration_string(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis().max(1))
    }
}

impl ConsulBackend {
    /// 创建新的 Consul 后端
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let invalid = || {
            RegistryError::config(format!(
                "Consul address must be an http:// or https:// URL, got {:?}",
                config.address
            ))
        };
        let base_url = Url::parse(&config.address).map_err(|_| invalid())?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(invalid());
        }

        let http_client = HttpClient::builder().build()?;

        Ok(Self {
            http_client,
            base_url,
            passing_only: config.passing_only,
            wait: config.wait,
            retry_interval: config.retry_interval.max(MIN_RETRY_INTERVAL),
            request_timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// 在基础地址后追加路径段，每段单独做百分号编码
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::config("Consul address cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn health_url(&self, service_name: &str) -> Result<Url> {
        self.endpoint(&["v1", "health", "service", service_name])
    }
}

/// 非 2xx 响应转换为错误
async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RegistryError::status(status.as_u16(), body))
}

#[async_trait]
impl RegistryBackend for ConsulBackend {
    async fn register(&self, registration: &Registration) -> Result<()> {
        let url = self.endpoint(&["v1", "agent", "service", "register"])?;
        let payload = ConsulServiceRegistration::from(registration);

        let resp = self
            .http_client
            .put(url)
            .json(&payload)
            .timeout(self.request_timeout)
            .send()
            .await?;
        ensure_success(resp).await?;

        debug!(instance_id = %registration.id, "Consul accepted service registration");
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<()> {
        let url = self.endpoint(&["v1", "agent", "service", "deregister", instance_id])?;
        let resp = self
            .http_client
            .put(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn query_instances(&self, service_name: &str) -> Result<Vec<ServiceEntry>> {
        let mut request = self
            .http_client
            .get(self.health_url(service_name)?)
            .timeout(self.request_timeout);
        if self.passing_only {
            request = request.query(&[("passing", "true")]);
        }

        let resp = ensure_success(request.send().await?).await?;
        let body = resp.bytes().await?;
        let entries: Vec<ServiceEntry> = serde_json::from_slice(&body)?;
        Ok(entries)
    }

    async fn watch(&self, service_name: &str) -> Result<mpsc::Receiver<WatchEvent>> {
        let (tx, rx) = mpsc::channel(16);
        let poller = WatchPoller {
            http_client: self.http_client.clone(),
            url: self.health_url(service_name)?,
            service_name: service_name.to_string(),
            wait: self.wait,
            retry_interval: self.retry_interval,
            request_timeout: self.request_timeout,
        };
        tokio::spawn(poller.run(tx));
        Ok(rx)
    }
}

/// 基于阻塞查询的监听任务
struct WatchPoller {
    http_client: HttpClient,
    url: Url,
    service_name: String,
    wait: Duration,
    retry_interval: Duration,
    request_timeout: Duration,
}

impl WatchPoller {
    async fn run(self, tx: mpsc::Sender<WatchEvent>) {
        info!(service = %self.service_name, "Consul watch started");
        let mut last_index: Option<u64> = None;
        let mut last_payload: Option<WatchPayload> = None;

        loop {
            let polled = tokio::select! {
                _ = tx.closed() => break,
                polled = self.poll(last_index.unwrap_or(0)) => polled,
            };

            let (index, payload) = match polled {
                Ok(polled) => polled,
                Err(e) => {
                    warn!(
                        service = %self.service_name,
                        error = %e,
                        unreachable = e.is_unreachable(),
                        retry_in = ?self.retry_interval,
                        "Consul watch request failed"
                    );
                    if self.pause(&tx, self.retry_interval).await {
                        continue;
                    }
                    break;
                }
            };

            if index == 0 && !self.pause(&tx, self.retry_interval).await {
                break;
            }

            // 序号未变化说明阻塞查询超时，没有新数据
            if last_index == Some(index) {
                continue;
            }
            let previous = last_index;
            // 序号回退时从 0 重新开始
            last_index = Some(match previous {
                Some(prev) if index < prev => 0,
                _ => index,
            });

            if previous.is_some() && last_payload.as_ref() == Some(&payload) {
                continue;
            }
            last_payload = Some(payload.clone());

            if tx.send(WatchEvent::new(index, payload)).await.is_err() {
                break;
            }
        }

        debug!(service = %self.service_name, "Consul watch stopped");
    }

    async fn poll(&self, index: u64) -> Result<(u64, WatchPayload)> {
        let resp = self
            .http_client
            .get(self.url.clone())
            .query(&[
                ("index", index.to_string()),
                ("wait", duration_string(self.wait)),
            ])
            .timeout(self.wait + self.wait / 16 + self.request_timeout)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        let index = resp
            .headers()
            .get(CONSUL_INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let body = resp.bytes().await?;

        Ok((index, WatchPayload::from_body(&body)))
    }

    /// 等待一段时间；接收端关闭时返回 false
    async fn pause(&self, tx: &mpsc::Sender<WatchEvent>, duration: Duration) -> bool {
        tokio::select! {
            _ = tx.closed() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
