//! Table catalog handlers: schema overview and full-table browse.

use crate::error::AppError;
use crate::state::AppState;
use crate::sql;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/api/tablas",
    responses((status = 200, description = "Tablas del esquema con sus columnas"))
)]
pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let tablas: Vec<Value> = state
        .catalog
        .entries()
        .iter()
        .map(|e| {
            json!({
                "nombre": e.name,
                "descripcion": e.description,
                "columnas": e.column_names(),
            })
        })
        .collect();
    Json(json!({ "success": true, "tablas": tablas }))
}

#[utoipa::path(
    get,
    path = "/api/tablas/{tabla}",
    params(("tabla" = String, Path, description = "Nombre de la tabla")),
    responses(
        (status = 200, description = "Columnas y filas de la tabla"),
        (status = 400, description = "Tabla no permitida")
    )
)]
pub async fn browse(
    State(state): State<AppState>,
    Path(tabla): Path<String>,
) -> Result<Json<Value>, AppError> {
    let entry = state.catalog.get(&tabla).ok_or_else(|| AppError::UnknownTable {
        table: tabla.clone(),
        available: state
            .catalog
            .entries()
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })?;
    let q = sql::select_catalog(entry, state.gateway.dialect());
    let data = state.gateway.fetch(&q).await?;
    Ok(Json(json!({
        "success": true,
        "tabla": entry.name,
        "descripcion": entry.description,
        "columnas": entry.column_names(),
        "data": data,
    })))
}
