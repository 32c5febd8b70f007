//! Registry-driven CRUD handlers: list, read, create, update, delete.

use crate::error::AppError;
use crate::response::{deleted, success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// Malformed or missing JSON bodies are validation errors, reported with the usual envelope.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

#[utoipa::path(
    get,
    path = "/api/crud/{tabla}",
    params(("tabla" = String, Path, description = "Pacientes, Doctores o Citas")),
    responses(
        (status = 200, description = "Todas las filas activas"),
        (status = 400, description = "Tabla no permitida")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Path(tabla): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.dispatcher.list(&tabla).await?.into_rows();
    Ok(success_many(rows))
}

#[utoipa::path(
    get,
    path = "/api/crud/{tabla}/{id}",
    params(
        ("tabla" = String, Path, description = "Pacientes, Doctores o Citas"),
        ("id" = i64, Path, description = "Clave primaria")
    ),
    responses(
        (status = 200, description = "Registro encontrado"),
        (status = 404, description = "No encontrado")
    )
)]
pub async fn read(
    State(state): State<AppState>,
    Path((tabla, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.dispatcher.get_by_id(&tabla, &id).await?.into_record()?;
    Ok(success_one_ok(record))
}

#[utoipa::path(
    post,
    path = "/api/crud/{tabla}",
    params(("tabla" = String, Path, description = "Pacientes, Doctores o Citas")),
    responses(
        (status = 201, description = "Registro creado"),
        (status = 400, description = "Sin datos, tabla no permitida o restricción violada"),
        (status = 409, description = "Conflicto de horario")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Path(tabla): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(body)?;
    let record = state.dispatcher.create(&tabla, &body).await?.into_record()?;
    Ok(success_one(record))
}

#[utoipa::path(
    put,
    path = "/api/crud/{tabla}/{id}",
    params(
        ("tabla" = String, Path, description = "Pacientes, Doctores o Citas"),
        ("id" = i64, Path, description = "Clave primaria")
    ),
    responses(
        (status = 200, description = "Registro actualizado"),
        (status = 404, description = "No encontrado"),
        (status = 409, description = "Conflicto de horario")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path((tabla, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(body)?;
    let record = state
        .dispatcher
        .update(&tabla, &id, &body)
        .await?
        .into_record()?;
    Ok(success_one_ok(record))
}

#[utoipa::path(
    delete,
    path = "/api/crud/{tabla}/{id}",
    params(
        ("tabla" = String, Path, description = "Pacientes, Doctores o Citas"),
        ("id" = i64, Path, description = "Clave primaria")
    ),
    responses((status = 200, description = "Eliminado; affected = 0 si no existía"))
)]
pub async fn remove(
    State(state): State<AppState>,
    Path((tabla, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.dispatcher.remove(&tabla, &id).await?;
    Ok(deleted(outcome.affected()))
}
