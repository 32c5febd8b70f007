//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid identifier in registry: {0}")]
    InvalidIdentifier(String),
    #[error("invalid registry entry {table}: {reason}")]
    InvalidTable { table: String, reason: String },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("unsupported database url scheme: {0}")]
    UnsupportedDatabase(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Tabla no permitida. Usa: {available}")]
    UnknownTable { table: String, available: String },
    #[error("{0}")]
    Validation(String),
    #[error("No encontrado")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("query failed: {source}")]
    Query {
        sql: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("could not connect to database after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn query(sql: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::Query {
            sql: sql.into(),
            source,
        }
    }

    /// True when the engine rejected a write because of a unique index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Query {
                source: sqlx::Error::Database(db),
                ..
            } => db.code().map(|code| unique_code(&code)).unwrap_or(false),
            _ => false,
        }
    }

    /// True when the engine rejected a write because of a NOT NULL, UNIQUE, CHECK or FOREIGN KEY rule.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            AppError::Query {
                source: sqlx::Error::Database(db),
                ..
            } => db
                .code()
                .map(|code| constraint_code(&code))
                .unwrap_or(false),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownTable { .. } | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Query { .. } if self.is_constraint_violation() => StatusCode::BAD_REQUEST,
            AppError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Query { .. } | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// PostgreSQL `23505` or SQLite `SQLITE_CONSTRAINT_UNIQUE` (2067).
fn unique_code(code: &str) -> bool {
    code == "23505" || code == "2067"
}

/// PostgreSQL class 23 (integrity constraint violation) or a SQLite SQLITE_CONSTRAINT result code.
fn constraint_code(code: &str) -> bool {
    if code.starts_with("23") && code.len() == 5 {
        return true;
    }
    // SQLite reports the extended result code; the primary code is the low byte.
    code.parse::<i32>().map(|n| n & 0xff == 19).unwrap_or(false)
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn error(error: String) -> Self {
        ErrorBody {
            success: false,
            error: Some(error),
            message: None,
        }
    }

    pub fn message(message: String) -> Self {
        ErrorBody {
            success: false,
            error: None,
            message: Some(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::NotFound => ErrorBody::message(self.to_string()),
            AppError::Query { sql, source } if status.is_server_error() => {
                tracing::error!(sql = %sql, error = %source, "query failed");
                ErrorBody::error(source.to_string())
            }
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "request failed");
                ErrorBody::error(self.to_string())
            }
            AppError::Query { source, .. } => ErrorBody::error(source.to_string()),
            _ => ErrorBody::error(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_codes_cover_both_engines() {
        assert!(constraint_code("23505"));
        assert!(constraint_code("23502"));
        assert!(constraint_code("19"));
        assert!(constraint_code("1299"));
        assert!(constraint_code("2067"));
        assert!(!constraint_code("42883"));
        assert!(!constraint_code("1"));
        assert!(unique_code("23505"));
        assert!(unique_code("2067"));
        assert!(!unique_code("1555"));
        assert!(!unique_code("23503"));
    }

    #[test]
    fn status_mapping() {
        let unknown = AppError::UnknownTable {
            table: "Foo".into(),
            available: "Pacientes".into(),
        };
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            unknown.to_string(),
            "Tabla no permitida. Usa: Pacientes"
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound.to_string(), "No encontrado");
        assert_eq!(
            AppError::Conflict("taken".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::query("SELECT 1", sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
