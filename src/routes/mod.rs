//! Route assembly: per-concern routers merged with the shared middleware stack.

mod common;
mod crud;
mod gallery;

pub use common::common_routes_with_ready;
pub use crud::crud_routes;
pub use gallery::{catalog_routes, gallery_routes};

use crate::config::ServerConfig;
use crate::error::ErrorBody;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, http::StatusCode, response::IntoResponse, Json, Router};
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::message("Ruta no encontrada".into())),
    )
}

/// Full application router.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(crud_routes(state.clone()))
        .merge(gallery_routes(state.clone()))
        .merge(catalog_routes(state))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(RequestBodyLimitLayer::new(config.body_limit));
    let router = match config.request_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    };
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
