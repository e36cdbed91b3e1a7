//! 服务注册/注销集成测试

mod common;

use common::FakeBackend;
use flare_registry_client::registry::{
    DEREGISTER_CRITICAL_AFTER, HEALTH_CHECK_INTERVAL, HealthCheckSpec, Registration,
    generate_instance_id,
};
use flare_registry_client::{RegistryClient, ServiceConfig, ServiceInfo};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// 测试：注册成功后注销，后端收到注册时生成的实例 ID
#[tokio::test]
async fn test_register_then_deregister() {
    let backend = Arc::new(FakeBackend::new());
    let client = RegistryClient::new(backend.clone());

    assert!(
        client
            .register("orders", "10.0.0.5", 8080, HashMap::new(), "/health")
            .await
    );

    let info = client.service_info().await.expect("identity should be held");
    assert_eq!(info.service_name, "orders");
    assert_eq!(info.service_host, "10.0.0.5");
    assert_eq!(info.service_port, 8080);
    assert!(info.instance_id.starts_with("orders-"));

    let registrations = backend.registrations.lock().unwrap().clone();
    assert_eq!(registrations.len(), 1);
    let registration = &registrations[0];
    assert_eq!(registration.id, info.instance_id);
    assert_eq!(registration.name, "orders");
    assert_eq!(registration.address, "10.0.0.5");
    assert_eq!(registration.port, 8080);
    assert_eq!(registration.check.http, "http://10.0.0.5:8080/health");
    assert_eq!(registration.check.interval, Duration::from_secs(15));
    assert_eq!(
        registration.check.deregister_critical_service_after,
        Duration::from_secs(30)
    );

    assert!(client.deregister().await);
    assert_eq!(
        backend.deregistrations.lock().unwrap().clone(),
        vec![info.instance_id.clone()]
    );
}

/// 测试：未注册时注销返回 false，不调用后端
#[tokio::test]
async fn test_deregister_before_register() {
    let backend = Arc::new(FakeBackend::new());
    let client = RegistryClient::new(backend.clone());

    assert!(!client.deregister().await);
    assert!(backend.deregistrations.lock().unwrap().is_empty());
}

/// 测试：注册失败返回 false，不保留新身份
#[tokio::test]
async fn test_register_failure_leaves_no_identity() {
    let backend = Arc::new(FakeBackend::new());
    backend.fail_register.store(true, Ordering::SeqCst);
    let client = RegistryClient::new(backend.clone());

    assert!(
        !client
            .register("orders", "10.0.0.5", 8080, HashMap::new(), "/health")
            .await
    );
    assert!(client.service_info().await.is_none());
    assert!(!client.deregister().await);
    assert!(backend.deregistrations.lock().unwrap().is_empty());
}

/// 测试：注册失败时保留之前成功注册的身份
#[tokio::test]
async fn test_register_failure_keeps_previous_identity() {
    let backend = Arc::new(FakeBackend::new());
    let client = RegistryClient::new(backend.clone());

    assert!(
        client
            .register("orders", "10.0.0.5", 8080, HashMap::new(), "/health")
            .await
    );
    let first = client.service_info().await.unwrap();

    backend.fail_register.store(true, Ordering::SeqCst);
    assert!(
        !client
            .register("payments", "10.0.0.6", 9090, HashMap::new(), "/health")
            .await
    );
    assert_eq!(client.service_info().await, Some(first));
}

/// 测试：再次注册覆盖旧身份
#[tokio::test]
async fn test_register_overwrites_identity() {
    let backend = Arc::new(FakeBackend::new());
    let client = RegistryClient::new(backend.clone());

    assert!(client.register("orders", "10.0.0.5", 8080, HashMap::new(), "/health").await);
    let first = client.service_info().await.unwrap();
    assert!(client.register("orders", "10.0.0.5", 8080, HashMap::new(), "/health").await);
    let second = client.service_info().await.unwrap();

    assert_ne!(first.instance_id, second.instance_id);
}

/// 测试：注销后身份不清除，重复注销使用同一实例 ID
#[tokio::test]
async fn test_deregister_is_sticky() {
    let backend = Arc::new(FakeBackend::new());
    let client = RegistryClient::new(backend.clone());

    assert!(client.register("orders", "10.0.0.5", 8080, HashMap::new(), "/health").await);
    let instance_id = client.service_info().await.unwrap().instance_id;

    assert!(client.deregister().await);
    assert!(client.deregister().await);

    assert_eq!(
        backend.deregistrations.lock().unwrap().clone(),
        vec![instance_id.clone(), instance_id]
    );
}

/// 测试：后端注销失败返回 false
#[tokio::test]
async fn test_deregister_backend_failure() {
    let backend = Arc::new(FakeBackend::new());
    let client = RegistryClient::new(backend.clone());

    assert!(client.register("orders", "10.0.0.5", 8080, HashMap::new(), "/health").await);
    backend.fail_deregister.store(true, Ordering::SeqCst);

    assert!(!client.deregister().await);
    assert!(client.service_info().await.is_some());
}

/// 测试：使用配置注册，元数据透传
#[tokio::test]
async fn test_register_from_config() {
    let backend = Arc::new(FakeBackend::new());
    let client = RegistryClient::new(backend.clone());
    let mut meta = HashMap::new();
    meta.insert("version".to_string(), "v1.2.0".to_string());
    let service = ServiceConfig {
        name: "orders".to_string(),
        host: "10.0.0.5".to_string(),
        port: 8080,
        health_path: "/healthz".to_string(),
        meta: meta.clone(),
    };

    assert!(client.register_from_config(&service).await);

    let registration = backend.registrations.lock().unwrap()[0].clone();
    assert_eq!(registration.meta, meta);
    assert_eq!(registration.check.http, "http://10.0.0.5:8080/healthz");
}

/// 测试：注册记录构建
#[test]
fn test_registration_record() {
    let info = ServiceInfo::new("orders", "10.0.0.5", 8080, "orders-abc");
    let registration = Registration::for_service(&info, HashMap::new(), "/health");

    assert_eq!(registration.id, "orders-abc");
    assert_eq!(
        registration.check,
        HealthCheckSpec {
            http: "http://10.0.0.5:8080/health".to_string(),
            interval: HEALTH_CHECK_INTERVAL,
            deregister_critical_service_after: DEREGISTER_CRITICAL_AFTER,
        }
    );
}

/// 测试：实例 ID 以服务名为前缀且全局唯一
#[test]
fn test_generate_instance_id() {
    let a = generate_instance_id("orders");
    let b = generate_instance_id("orders");

    assert!(a.starts_with("orders-"));
    assert_ne!(a, b);
    let suffix = a.trim_start_matches("orders-");
    assert!(uuid::Uuid::parse_str(suffix).is_ok());
}
