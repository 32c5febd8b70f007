//! Direct parameterized SQL. Always available.

use crate::error::AppError;
use crate::gateway::{CountFrom, Gateway};
use crate::registry::TableDescriptor;
use crate::service::{Attempt, Executor, Projection};
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct RawSqlExecutor {
    gateway: Arc<Gateway>,
}

impl RawSqlExecutor {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        RawSqlExecutor { gateway }
    }
}

#[async_trait]
impl Executor for RawSqlExecutor {
    fn name(&self) -> &'static str {
        "raw_sql"
    }

    async fn list(&self, table: &TableDescriptor) -> Result<Attempt<Vec<Value>>, AppError> {
        let q = sql::select_all(table, self.gateway.dialect());
        Ok(Attempt::Done(self.gateway.fetch(&q).await?))
    }

    async fn read(&self, table: &TableDescriptor, id: i64) -> Result<Attempt<Option<Value>>, AppError> {
        let q = sql::select_by_id(table, self.gateway.dialect(), id);
        Ok(Attempt::Done(self.gateway.fetch_optional(&q).await?))
    }

    async fn create(
        &self,
        table: &TableDescriptor,
        fields: &Projection,
    ) -> Result<Attempt<Value>, AppError> {
        let q = sql::insert(table, self.gateway.dialect(), fields.fields());
        let row = self
            .gateway
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| AppError::query(q.sql.clone(), sqlx::Error::RowNotFound))?;
        Ok(Attempt::Done(row))
    }

    async fn update(
        &self,
        table: &TableDescriptor,
        id: i64,
        fields: &Projection,
    ) -> Result<Attempt<Option<Value>>, AppError> {
        let q = sql::update(table, self.gateway.dialect(), id, fields.fields());
        Ok(Attempt::Done(self.gateway.fetch_optional(&q).await?))
    }

    async fn delete(
        &self,
        table: &TableDescriptor,
        id: i64,
        audit: Option<&QueryBuf>,
    ) -> Result<Attempt<u64>, AppError> {
        let q = sql::delete(table, self.gateway.dialect(), id);
        let count = self
            .gateway
            .run_in_transaction(&q, CountFrom::RowsAffected, audit)
            .await?;
        Ok(Attempt::Done(count))
    }
}
