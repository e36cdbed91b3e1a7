//! Flare Registry Client
//!
//! Client-side service registry adapter: registers this process as an instance of a
//! named service and resolves healthy instances of any service through a local cache
//! kept fresh by one long-lived watch per service name.

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod registry;
pub mod types;

// Re-exports
pub use client::{ClientBuilder, RegistryClient};
pub use config::{Config, LoggingConfig, RegistryConfig, ServiceConfig};
pub use discovery::{
    ConsulBackend, HealthCheckStatus, HealthStatus, InstanceCache, InstanceList, RegistryBackend,
    ServiceEntry, ServiceInstance, ServiceResolver, SubscriptionState, WatchCoordinator,
    WatchEvent, WatchPayload,
};
pub use error::{RegistryError, Result};
pub use logging::init_tracing;
pub use registry::{HealthCheckSpec, Registration, RegistrationManager};
pub use types::ServiceInfo;
