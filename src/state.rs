//! Shared application state for all routes.

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::gateway::Gateway;
use crate::registry::{Catalog, Registry};
use crate::service::Dispatcher;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub registry: Arc<Registry>,
    pub catalog: Arc<Catalog>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Hospital registry and catalog over a gateway built from `config`. Does not connect.
    pub fn from_config(config: &ServerConfig) -> Result<Self, AppError> {
        let gateway = Arc::new(Gateway::new(config.gateway_options())?);
        let registry = Arc::new(Registry::hospital()?);
        let dispatcher = Dispatcher::new(registry.clone(), gateway.clone(), config.dispatch_options());
        Ok(AppState {
            gateway,
            registry,
            catalog: Arc::new(Catalog::hospital()?),
            dispatcher: Arc::new(dispatcher),
        })
    }
}
