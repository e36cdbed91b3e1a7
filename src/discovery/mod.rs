//! 服务发现模块
//!
//! 实例缓存 + 每个服务名一个长连接订阅，首次访问时通过双重检查加锁完成填充。

pub mod backend;
pub mod cache;
pub mod instance;
pub mod resolver;
pub mod watch;

pub use backend::{RegistryBackend, WatchEvent, WatchPayload};
pub use backend::consul::ConsulBackend;
pub use cache::{InstanceCache, InstanceList};
pub use instance::{HealthCheckStatus, HealthStatus, ServiceEntry, ServiceInstance};
pub use resolver::ServiceResolver;
pub use watch::{SubscriptionState, WatchCoordinator};
