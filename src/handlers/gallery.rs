//! Query gallery handlers.

use crate::error::AppError;
use crate::gallery::{self, GALLERY};
use crate::response::Titled;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/api/consultas",
    responses((status = 200, description = "Consultas disponibles"))
)]
pub async fn index() -> Json<Value> {
    Json(json!({ "success": true, "consultas": GALLERY }))
}

#[utoipa::path(
    get,
    path = "/api/consultas/{nombre}",
    params(("nombre" = String, Path, description = "Nombre de la consulta")),
    responses(
        (status = 200, description = "Resultado de la consulta"),
        (status = 404, description = "Consulta desconocida")
    )
)]
pub async fn run(
    State(state): State<AppState>,
    Path(nombre): Path<String>,
) -> Result<Json<Titled<Value>>, AppError> {
    let (entry, data) = gallery::run(&state.gateway, &nombre).await?;
    Ok(Json(Titled {
        success: true,
        titulo: entry.titulo,
        descripcion: entry.descripcion,
        data,
    }))
}
