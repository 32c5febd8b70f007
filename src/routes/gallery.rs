//! Query gallery and table catalog routes (read-only).

use crate::handlers::{catalog, gallery};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn gallery_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/consultas", get(gallery::index))
        .route("/api/consultas/:nombre", get(gallery::run))
        .with_state(state)
}

pub fn catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/tablas", get(catalog::list))
        .route("/api/tablas/:tabla", get(catalog::browse))
        .with_state(state)
}
