//! SQL dialect differences between the supported engines.

use crate::error::ConfigError;
use crate::registry::SqlType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            _ => Err(ConfigError::UnsupportedDatabase(scheme)),
        }
    }

    /// Placeholder for the n-th (1-based) parameter. PostgreSQL gets an explicit cast so text-typed
    /// binds land in integer and date columns.
    pub fn placeholder(self, n: usize, ty: Option<SqlType>) -> String {
        match (self, ty) {
            (Dialect::Postgres, Some(t)) => format!("${}::{}", n, t.pg_name()),
            _ => format!("${}", n),
        }
    }

    /// Column expression for SELECT / RETURNING lists. Dates are read as text on PostgreSQL.
    pub fn select_expr(self, column: &str, ty: SqlType) -> String {
        let q = super::quoted(column);
        match (self, ty) {
            (Dialect::Postgres, SqlType::Date) => format!("{}::text AS {}", q, q),
            _ => q,
        }
    }

    /// SQLite has no stored routines.
    pub fn supports_routines(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// True when an engine error means "this routine does not exist", as opposed to a routine
    /// that ran and failed.
    pub fn routine_missing(self, code: Option<&str>, message: &str) -> bool {
        match self {
            Dialect::Postgres => matches!(code, Some("42883") | Some("42P01")),
            Dialect::Sqlite => {
                message.starts_with("no such function") || message.starts_with("no such table")
            }
        }
    }

    /// DDL fragment for an auto-increment integer primary key.
    pub fn serial_primary_key(self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "SERIAL PRIMARY KEY",
        }
    }

    /// DDL column type. SQLite keeps dates as TEXT.
    pub fn column_type(self, ty: SqlType) -> &'static str {
        match (self, ty) {
            (_, SqlType::Integer) => "INTEGER",
            (_, SqlType::Text) => "TEXT",
            (Dialect::Sqlite, SqlType::Date) => "TEXT",
            (Dialect::Postgres, SqlType::Date) => "DATE",
        }
    }
}
