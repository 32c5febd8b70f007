//! Hospital records: registry-driven REST backend with stored-procedure fallback and canned reports.

pub mod config;
pub mod error;
pub mod gallery;
pub mod gateway;
pub mod handlers;
pub mod openapi;
pub mod registry;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_from_env, load_with, ServerConfig};
pub use error::{AppError, ConfigError};
pub use gateway::{Gateway, GatewayOptions};
pub use registry::{Catalog, Registry};
pub use response::{success_many, success_one};
pub use routes::{app, catalog_routes, common_routes_with_ready, crud_routes, gallery_routes};
pub use service::{DispatchOptions, Dispatcher, OperationOutcome};
pub use state::AppState;
pub use store::ensure_schema;
