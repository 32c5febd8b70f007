//! Executor capability: one way of carrying out a CRUD operation against the engine.

use crate::error::AppError;
use crate::registry::TableDescriptor;
use crate::service::Projection;
use crate::sql::QueryBuf;
use async_trait::async_trait;
use serde_json::Value;

/// Result of asking one executor to perform an operation. `Unavailable` means "this executor
/// cannot serve the call, try the next one"; it is never used for failures of a call that ran.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    Unavailable,
}

#[async_trait]
pub trait Executor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn list(&self, table: &TableDescriptor) -> Result<Attempt<Vec<Value>>, AppError>;

    async fn read(&self, table: &TableDescriptor, id: i64) -> Result<Attempt<Option<Value>>, AppError>;

    async fn create(
        &self,
        table: &TableDescriptor,
        fields: &Projection,
    ) -> Result<Attempt<Value>, AppError>;

    /// Updated row, or `None` when no (active) row has this id.
    async fn update(
        &self,
        table: &TableDescriptor,
        id: i64,
        fields: &Projection,
    ) -> Result<Attempt<Option<Value>>, AppError>;

    /// Number of rows removed (or deactivated). When a row was removed, `audit` runs in the
    /// same transaction as the delete.
    async fn delete(
        &self,
        table: &TableDescriptor,
        id: i64,
        audit: Option<&QueryBuf>,
    ) -> Result<Attempt<u64>, AppError>;
}
