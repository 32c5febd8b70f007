//! CRUD routes. The table name is a path segment resolved against the registry by the handlers.

use crate::handlers::crud::{create, list, read, remove, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn crud_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/crud/:tabla", get(list).post(create))
        .route("/api/crud/:tabla/:id", get(read).put(update).delete(remove))
        .with_state(state)
}
