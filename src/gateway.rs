//! Database gateway: the only owner of the connection pool.
//!
//! The pool is created on the first `connect`/`query`/`execute` and reused afterwards. Concurrent
//! first callers share one initialization; a failed initialization is retried by the next caller.

use crate::error::{AppError, ConfigError};
use crate::sql::{bind_all, Dialect, QueryBuf};
use serde_json::Value;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::AnyPool;
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Clone, Debug)]
pub struct GatewayOptions {
    pub url: String,
    pub max_connections: u32,
    /// Total connection attempts before giving up (at least one).
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl GatewayOptions {
    pub fn new(url: impl Into<String>) -> Self {
        GatewayOptions {
            url: url.into(),
            max_connections: 10,
            connect_attempts: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// Where a transactional statement reports how many rows it touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountFrom {
    RowsAffected,
    /// First numeric column of the first returned row (a routine's result).
    ReturnedRow,
}

pub struct Gateway {
    options: GatewayOptions,
    dialect: Dialect,
    pool: OnceCell<AnyPool>,
}

impl Gateway {
    pub fn new(options: GatewayOptions) -> Result<Self, ConfigError> {
        let dialect = Dialect::from_url(&options.url)?;
        Ok(Gateway {
            options,
            dialect,
            pool: OnceCell::new(),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Pool handle, connecting (with retries) on first use.
    pub async fn connect(&self) -> Result<&AnyPool, AppError> {
        self.pool.get_or_try_init(|| self.connect_with_retry()).await
    }

    async fn connect_with_retry(&self) -> Result<AnyPool, AppError> {
        sqlx::any::install_default_drivers();
        let max_attempts = self.options.connect_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = AnyPoolOptions::new()
                .max_connections(self.options.max_connections)
                .connect(&self.options.url)
                .await;
            match result {
                Ok(pool) => {
                    tracing::info!(attempt, dialect = ?self.dialect, "database connected");
                    return Ok(pool);
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = self.options.retry_delay.as_millis() as u64,
                        error = %e,
                        "database connection failed, retrying"
                    );
                    tokio::time::sleep(self.options.retry_delay).await;
                }
                Err(e) => {
                    return Err(AppError::Connection {
                        attempts: attempt,
                        source: e,
                    })
                }
            }
        }
    }

    /// Run a row-returning statement; each row becomes a JSON object keyed by column name.
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError> {
        let pool = self.connect().await?;
        tracing::debug!(sql = %sql, params = ?params, "query");
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::query(sql, e))?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// Run a statement for its effect.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult, AppError> {
        let pool = self.connect().await?;
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let done = bind_all(sqlx::query(sql), params)
            .execute(pool)
            .await
            .map_err(|e| AppError::query(sql, e))?;
        Ok(ExecResult {
            rows_affected: done.rows_affected(),
            last_insert_id: done.last_insert_id(),
        })
    }

    pub async fn fetch(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        self.query(&q.sql, &q.params).await
    }

    pub async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        Ok(self.fetch(q).await?.into_iter().next())
    }

    /// Run `statement` and, if it touched any row, `follow_up` in the same transaction.
    /// Nothing is committed unless both succeed.
    pub async fn run_in_transaction(
        &self,
        statement: &QueryBuf,
        count_from: CountFrom,
        follow_up: Option<&QueryBuf>,
    ) -> Result<u64, AppError> {
        let pool = self.connect().await?;
        let mut tx = pool.begin().await.map_err(|e| AppError::query("BEGIN", e))?;
        tracing::debug!(sql = %statement.sql, params = ?statement.params, "transaction");
        let query = bind_all(sqlx::query(&statement.sql), &statement.params);
        let count = match count_from {
            CountFrom::RowsAffected => query
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::query(statement.sql.as_str(), e))?
                .rows_affected(),
            CountFrom::ReturnedRow => query
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::query(statement.sql.as_str(), e))?
                .map(|row| first_count(&row_to_json(&row)))
                .unwrap_or(0),
        };
        if count > 0 {
            if let Some(q) = follow_up {
                tracing::debug!(sql = %q.sql, params = ?q.params, "transaction follow-up");
                bind_all(sqlx::query(&q.sql), &q.params)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AppError::query(q.sql.as_str(), e))?;
            }
        }
        tx.commit().await.map_err(|e| AppError::query("COMMIT", e))?;
        Ok(count)
    }

    /// Readiness probe.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.query("SELECT 1", &[]).await.map(|_| ())
    }

    /// Close the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }
}

fn row_to_json(row: &AnyRow) -> Value {
    use sqlx::{Column, Row};
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        map.insert(col.name().to_string(), cell_to_value(row, col.ordinal()));
    }
    Value::Object(map)
}

fn first_count(row: &Value) -> u64 {
    row.as_object()
        .and_then(|cols| cols.values().find_map(Value::as_u64))
        .unwrap_or(0)
}

fn cell_to_value(row: &AnyRow, idx: usize) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(b);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    Value::Null
}
