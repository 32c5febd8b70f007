//! Server settings resolved from the environment.

use crate::gateway::GatewayOptions;
use crate::service::DispatchOptions;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/hospital.db?mode=rwc";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub connect_retries: u32,
    pub retry_delay: Duration,
    pub use_procedures: bool,
    pub bootstrap_schema: bool,
    pub audit_deletes: bool,
    pub request_timeout: Option<Duration>,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_connections: 10,
            connect_retries: 5,
            retry_delay: Duration::from_secs(5),
            use_procedures: true,
            bootstrap_schema: true,
            audit_deletes: true,
            request_timeout: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            url: self.database_url.clone(),
            max_connections: self.max_connections,
            connect_attempts: self.connect_retries,
            retry_delay: self.retry_delay,
        }
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            use_procedures: self.use_procedures,
            audit_deletes: self.audit_deletes,
        }
    }
}
