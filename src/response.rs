//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub success: bool,
    pub data: Vec<T>,
}

#[derive(Serialize)]
pub struct Deleted {
    pub success: bool,
    pub message: &'static str,
    pub affected: u64,
}

/// Gallery result: title and description of the statement plus its rows.
#[derive(Serialize)]
pub struct Titled<T> {
    pub success: bool,
    pub titulo: &'static str,
    pub descripcion: &'static str,
    pub data: Vec<T>,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::CREATED,
        Json(SuccessOne {
            success: true,
            data,
        }),
    )
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::OK,
        Json(SuccessOne {
            success: true,
            data,
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    (
        StatusCode::OK,
        Json(SuccessMany {
            success: true,
            data,
        }),
    )
}

pub fn deleted(affected: u64) -> (StatusCode, Json<Deleted>) {
    (
        StatusCode::OK,
        Json(Deleted {
            success: true,
            message: "Eliminado",
            affected,
        }),
    )
}
