//! 服务注册模块

pub mod manager;
pub mod record;

pub use manager::RegistrationManager;
pub use record::{
    DEREGISTER_CRITICAL_AFTER, HEALTH_CHECK_INTERVAL, HealthCheckSpec, Registration,
    generate_instance_id,
};
