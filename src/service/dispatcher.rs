//! CRUD dispatcher: table validation, payload projection and the executor chain.

use crate::error::AppError;
use crate::gateway::Gateway;
use crate::registry::{Registry, TableDescriptor};
use crate::service::{
    check_references, check_slot, parse_id, Attempt, Executor, ProcedureExecutor, Projection,
    RawSqlExecutor,
};
use crate::sql;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub struct DispatchOptions {
    /// Put the stored-routine executor ahead of raw SQL.
    pub use_procedures: bool,
    /// Record successful deletes in the audit table.
    pub audit_deletes: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        DispatchOptions {
            use_procedures: true,
            audit_deletes: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OperationOutcome {
    Rows(Vec<Value>),
    Affected { count: u64 },
}

impl OperationOutcome {
    pub fn into_rows(self) -> Vec<Value> {
        match self {
            OperationOutcome::Rows(rows) => rows,
            OperationOutcome::Affected { .. } => Vec::new(),
        }
    }

    /// First row, for single-record operations.
    pub fn into_record(self) -> Result<Value, AppError> {
        self.into_rows().into_iter().next().ok_or(AppError::NotFound)
    }

    pub fn affected(&self) -> u64 {
        match self {
            OperationOutcome::Rows(rows) => rows.len() as u64,
            OperationOutcome::Affected { count } => *count,
        }
    }
}

/// Ask each executor in turn; the first that does not answer `Unavailable` decides.
macro_rules! first_available {
    ($executors:expr, $table:expr, |$exec:ident| $call:expr) => {{
        let mut answer = None;
        for $exec in $executors.iter() {
            match $call.await? {
                Attempt::Done(value) => {
                    tracing::debug!(table = %$table.name, executor = $exec.name(), "served");
                    answer = Some(value);
                    break;
                }
                Attempt::Unavailable => continue,
            }
        }
        answer.ok_or_else(|| {
            AppError::Internal(format!("no executor available for {}", $table.name))
        })?
    }};
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    gateway: Arc<Gateway>,
    executors: Vec<Arc<dyn Executor>>,
    audit_deletes: bool,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, gateway: Arc<Gateway>, options: DispatchOptions) -> Self {
        let mut executors: Vec<Arc<dyn Executor>> = Vec::new();
        if options.use_procedures {
            executors.push(Arc::new(ProcedureExecutor::new(gateway.clone())));
        }
        executors.push(Arc::new(RawSqlExecutor::new(gateway.clone())));
        Self::with_executors(registry, gateway, executors, options.audit_deletes)
    }

    /// Custom executor chain, tried in the given order.
    pub fn with_executors(
        registry: Arc<Registry>,
        gateway: Arc<Gateway>,
        executors: Vec<Arc<dyn Executor>>,
        audit_deletes: bool,
    ) -> Self {
        Dispatcher {
            registry,
            gateway,
            executors,
            audit_deletes,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn describe(&self, table: &str) -> Result<&TableDescriptor, AppError> {
        self.registry.describe(table)
    }

    pub async fn list(&self, table: &str) -> Result<OperationOutcome, AppError> {
        let t = self.describe(table)?;
        let rows = first_available!(self.executors, t, |exec| exec.list(t));
        Ok(OperationOutcome::Rows(rows))
    }

    pub async fn get_by_id(&self, table: &str, id: &str) -> Result<OperationOutcome, AppError> {
        let t = self.describe(table)?;
        let id = parse_id(id)?;
        let row = first_available!(self.executors, t, |exec| exec.read(t, id));
        row.map(|r| OperationOutcome::Rows(vec![r]))
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, table: &str, body: &Value) -> Result<OperationOutcome, AppError> {
        let t = self.describe(table)?;
        let fields = Projection::from_body(t, body)?;
        if fields.is_empty() {
            return Err(AppError::Validation("Sin datos para crear".into()));
        }
        check_references(&self.registry, &self.gateway, t, &fields).await?;
        check_slot(&self.gateway, t, &fields, None).await?;
        let row = self
            .create_with_executors(t, &fields)
            .await
            .map_err(|e| slot_conflict(t, e))?;
        tracing::info!(table = %t.name, "record created");
        Ok(OperationOutcome::Rows(vec![row]))
    }

    pub async fn update(
        &self,
        table: &str,
        id: &str,
        body: &Value,
    ) -> Result<OperationOutcome, AppError> {
        let t = self.describe(table)?;
        let id = parse_id(id)?;
        let fields = Projection::from_body(t, body)?;
        if fields.is_empty() {
            return Err(AppError::Validation("Sin datos para actualizar".into()));
        }
        check_references(&self.registry, &self.gateway, t, &fields).await?;
        check_slot(&self.gateway, t, &fields, Some(id)).await?;
        let row = self
            .update_with_executors(t, id, &fields)
            .await
            .map_err(|e| slot_conflict(t, e))?;
        row.map(|r| OperationOutcome::Rows(vec![r]))
            .ok_or(AppError::NotFound)
    }

    async fn create_with_executors(
        &self,
        t: &TableDescriptor,
        fields: &Projection,
    ) -> Result<Value, AppError> {
        Ok(first_available!(self.executors, t, |exec| exec.create(t, fields)))
    }

    async fn update_with_executors(
        &self,
        t: &TableDescriptor,
        id: i64,
        fields: &Projection,
    ) -> Result<Option<Value>, AppError> {
        Ok(first_available!(self.executors, t, |exec| exec.update(t, id, fields)))
    }

    /// Delete (or deactivate) one row. A missing id is not an error: the count is 0.
    /// With auditing on, the audit row is written in the delete's transaction.
    pub async fn remove(&self, table: &str, id: &str) -> Result<OperationOutcome, AppError> {
        let t = self.describe(table)?;
        let id = parse_id(id)?;
        let audit = self.audit_deletes.then(|| {
            let at = chrono::Utc::now().to_rfc3339();
            sql::insert_audit(self.gateway.dialect(), &t.name, id, None, &at)
        });
        let count = first_available!(self.executors, t, |exec| exec.delete(t, id, audit.as_ref()));
        if count > 0 {
            tracing::info!(table = %t.name, id, audited = audit.is_some(), "record removed");
        }
        Ok(OperationOutcome::Affected { count })
    }
}

/// A write that lost the race for a slot trips the unique index; report it like the pre-check.
fn slot_conflict(table: &TableDescriptor, err: AppError) -> AppError {
    match &table.unique_slot {
        Some(rule) if err.is_unique_violation() => AppError::Conflict(rule.message.clone()),
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_accessors() {
        let rows = OperationOutcome::Rows(vec![json!({"ID": 1})]);
        assert_eq!(rows.affected(), 1);
        assert_eq!(rows.into_record().unwrap(), json!({"ID": 1}));
        let gone = OperationOutcome::Affected { count: 0 };
        assert_eq!(gone.affected(), 0);
        assert!(matches!(gone.into_record(), Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn unique_index_violation_on_citas_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = crate::gateway::GatewayOptions::new(format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("slot.db").display()
        ));
        options.connect_attempts = 1;
        let gateway = Gateway::new(options).unwrap();
        crate::store::ensure_schema(&gateway).await.unwrap();
        let insert = r#"INSERT INTO "Citas" ("doctor_id", "fecha") VALUES ($1, $2)"#;
        gateway.execute(r#"INSERT INTO "Doctores" ("nombre") VALUES ('Dr. Uno')"#, &[]).await.unwrap();
        gateway.execute(insert, &[json!(1), json!("2024-05-01")]).await.unwrap();
        let err = gateway
            .execute(insert, &[json!(1), json!("2024-05-01")])
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        let registry = Registry::hospital().unwrap();
        match slot_conflict(registry.describe("Citas").unwrap(), err) {
            AppError::Conflict(message) => assert_eq!(message, "El doctor ya tiene una cita a esa hora"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn only_slot_tables_turn_unique_errors_into_conflicts() {
        let registry = Registry::hospital().unwrap();
        let citas = registry.describe("Citas").unwrap();
        let other = AppError::Validation("x".into());
        assert!(matches!(slot_conflict(citas, other), AppError::Validation(_)));
        assert!(matches!(
            slot_conflict(registry.describe("Doctores").unwrap(), AppError::NotFound),
            AppError::NotFound
        ));
    }
}
