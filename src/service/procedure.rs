//! Stored-routine executor: `sp_<Table>_<Operation>` routines with named arguments.
//!
//! Reports `Unavailable` when the engine has no routines, when the engine says the routine does
//! not exist, or when a previous call already showed the table has no routines. Any other error
//! from a routine that exists is returned as-is, so a failed write is never replayed as raw SQL.

use crate::error::AppError;
use crate::gateway::{CountFrom, Gateway};
use crate::registry::{SqlType, TableDescriptor};
use crate::service::{Attempt, Executor, Projection};
use crate::sql::{self, Dialect, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routine {
    ReadAll,
    ReadById,
    Create,
    Update,
    Delete,
}

impl Routine {
    pub fn name_for(self, table: &str) -> String {
        let suffix = match self {
            Routine::ReadAll => "ReadAll",
            Routine::ReadById => "ReadById",
            Routine::Create => "Create",
            Routine::Update => "Update",
            Routine::Delete => "Delete",
        };
        format!("sp_{}_{}", table, suffix)
    }
}

/// Tables whose routines turned out to be missing.
#[derive(Default)]
struct MissingRoutines(RwLock<HashSet<String>>);

impl MissingRoutines {
    fn contains(&self, table: &str) -> bool {
        self.0.read().map(|set| set.contains(table)).unwrap_or(false)
    }

    fn insert(&self, table: &str) {
        if let Ok(mut set) = self.0.write() {
            set.insert(table.to_string());
        }
    }
}

pub struct ProcedureExecutor {
    gateway: Arc<Gateway>,
    missing: MissingRoutines,
}

impl ProcedureExecutor {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        ProcedureExecutor {
            gateway,
            missing: MissingRoutines::default(),
        }
    }

    /// Call statement for `routine`, or `None` when it cannot exist for this table.
    fn statement(
        &self,
        table: &TableDescriptor,
        routine: Routine,
        args: &[(&str, Option<SqlType>, Value)],
    ) -> Option<QueryBuf> {
        let dialect = self.gateway.dialect();
        if !dialect.supports_routines() || self.missing.contains(&table.name) {
            return None;
        }
        Some(sql::call_routine(dialect, &routine.name_for(&table.name), args))
    }

    /// A "routine missing" error becomes `Unavailable` and is remembered for the table.
    fn settle<T>(
        &self,
        table: &TableDescriptor,
        routine: Routine,
        result: Result<T, AppError>,
    ) -> Result<Attempt<T>, AppError> {
        match result {
            Ok(value) => Ok(Attempt::Done(value)),
            Err(e) if routine_missing(self.gateway.dialect(), &e) => {
                let name = routine.name_for(&table.name);
                tracing::warn!(table = %table.name, routine = %name, "stored routine missing, using raw SQL for this table");
                self.missing.insert(&table.name);
                Ok(Attempt::Unavailable)
            }
            Err(e) => Err(e),
        }
    }

    async fn call(
        &self,
        table: &TableDescriptor,
        routine: Routine,
        args: &[(&str, Option<SqlType>, Value)],
    ) -> Result<Attempt<Vec<Value>>, AppError> {
        match self.statement(table, routine, args) {
            Some(q) => self.settle(table, routine, self.gateway.fetch(&q).await),
            None => Ok(Attempt::Unavailable),
        }
    }
}

fn routine_missing(dialect: Dialect, err: &AppError) -> bool {
    match err {
        AppError::Query {
            source: sqlx::Error::Database(db),
            ..
        } => dialect.routine_missing(db.code().as_deref(), db.message()),
        _ => false,
    }
}

fn field_args(table: &TableDescriptor, fields: &Projection) -> Vec<(String, Option<SqlType>, Value)> {
    fields
        .fields()
        .iter()
        .map(|(name, v)| (name.clone(), table.field(name).map(|f| f.sql_type), v.clone()))
        .collect()
}

fn id_arg(id: i64) -> (&'static str, Option<SqlType>, Value) {
    ("id", Some(SqlType::Integer), Value::from(id))
}

fn borrow_args(owned: &[(String, Option<SqlType>, Value)]) -> Vec<(&str, Option<SqlType>, Value)> {
    owned
        .iter()
        .map(|(n, t, v)| (n.as_str(), *t, v.clone()))
        .collect()
}

#[async_trait]
impl Executor for ProcedureExecutor {
    fn name(&self) -> &'static str {
        "procedure"
    }

    async fn list(&self, table: &TableDescriptor) -> Result<Attempt<Vec<Value>>, AppError> {
        self.call(table, Routine::ReadAll, &[]).await
    }

    async fn read(&self, table: &TableDescriptor, id: i64) -> Result<Attempt<Option<Value>>, AppError> {
        Ok(match self.call(table, Routine::ReadById, &[id_arg(id)]).await? {
            Attempt::Done(rows) => Attempt::Done(rows.into_iter().next()),
            Attempt::Unavailable => Attempt::Unavailable,
        })
    }

    async fn create(
        &self,
        table: &TableDescriptor,
        fields: &Projection,
    ) -> Result<Attempt<Value>, AppError> {
        let owned = field_args(table, fields);
        match self.call(table, Routine::Create, &borrow_args(&owned)).await? {
            Attempt::Done(rows) => rows
                .into_iter()
                .next()
                .map(Attempt::Done)
                .ok_or_else(|| AppError::query(Routine::Create.name_for(&table.name), sqlx::Error::RowNotFound)),
            Attempt::Unavailable => Ok(Attempt::Unavailable),
        }
    }

    async fn update(
        &self,
        table: &TableDescriptor,
        id: i64,
        fields: &Projection,
    ) -> Result<Attempt<Option<Value>>, AppError> {
        let owned = field_args(table, fields);
        let mut args = vec![id_arg(id)];
        args.extend(borrow_args(&owned));
        Ok(match self.call(table, Routine::Update, &args).await? {
            Attempt::Done(rows) => Attempt::Done(rows.into_iter().next()),
            Attempt::Unavailable => Attempt::Unavailable,
        })
    }

    /// The delete routine returns one row whose single column is the affected count.
    async fn delete(
        &self,
        table: &TableDescriptor,
        id: i64,
        audit: Option<&QueryBuf>,
    ) -> Result<Attempt<u64>, AppError> {
        let Some(q) = self.statement(table, Routine::Delete, &[id_arg(id)]) else {
            return Ok(Attempt::Unavailable);
        };
        let result = self
            .gateway
            .run_in_transaction(&q, CountFrom::ReturnedRow, audit)
            .await;
        self.settle(table, Routine::Delete, result)
    }
}
