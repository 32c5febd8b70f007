//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and routine calls from table descriptors.

use super::{quoted, Dialect};
use crate::registry::{CatalogEntry, DeleteStrategy, FieldSpec, SlotRule, SqlType, TableDescriptor};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// SELECT list: primary key plus every allowed field, in registry order.
fn projection(table: &TableDescriptor, dialect: Dialect) -> String {
    let mut cols = vec![dialect.select_expr(&table.primary_key, SqlType::Integer)];
    cols.extend(
        table
            .allowed_fields
            .iter()
            .map(|f| dialect.select_expr(&f.name, f.sql_type)),
    );
    cols.join(", ")
}

pub fn select_columns(columns: &[FieldSpec], dialect: Dialect) -> String {
    columns
        .iter()
        .map(|c| dialect.select_expr(&c.name, c.sql_type))
        .collect::<Vec<_>>()
        .join(", ")
}

fn active_clause(table: &TableDescriptor) -> Option<String> {
    table.active_flag().map(|flag| format!("{} = 1", quoted(flag)))
}

fn sql_type_of(table: &TableDescriptor, column: &str) -> Option<SqlType> {
    table.field(column).map(|f| f.sql_type)
}

/// SELECT every (active) row ordered by primary key.
pub fn select_all(table: &TableDescriptor, dialect: Dialect) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = active_clause(table)
        .map(|c| format!(" WHERE {}", c))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        projection(table, dialect),
        quoted(&table.name),
        where_clause,
        quoted(&table.primary_key)
    );
    q
}

/// SELECT one (active) row by primary key.
pub fn select_by_id(table: &TableDescriptor, dialect: Dialect, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    let mut where_parts = vec![format!(
        "{} = {}",
        quoted(&table.primary_key),
        dialect.placeholder(n, Some(SqlType::Integer))
    )];
    where_parts.extend(active_clause(table));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        projection(table, dialect),
        quoted(&table.name),
        where_parts.join(" AND ")
    );
    q
}

/// INSERT the projected fields and return the stored row. The row is identified by the engine,
/// not by re-reading the newest primary key.
pub fn insert(table: &TableDescriptor, dialect: Dialect, fields: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (name, value) in fields {
        let Some(ty) = sql_type_of(table, name) else { continue };
        let n = q.push_param(value.clone());
        cols.push(quoted(name));
        placeholders.push(dialect.placeholder(n, Some(ty)));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(&table.name),
        cols.join(", "),
        placeholders.join(", "),
        projection(table, dialect)
    );
    q
}

/// UPDATE by primary key: SET only the projected fields. Returns the updated row, or no row when
/// nothing matched.
pub fn update(
    table: &TableDescriptor,
    dialect: Dialect,
    id: i64,
    fields: &[(String, Value)],
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (name, value) in fields {
        let Some(ty) = sql_type_of(table, name) else { continue };
        let n = q.push_param(value.clone());
        sets.push(format!("{} = {}", quoted(name), dialect.placeholder(n, Some(ty))));
    }
    let n = q.push_param(Value::from(id));
    let mut where_parts = vec![format!(
        "{} = {}",
        quoted(&table.primary_key),
        dialect.placeholder(n, Some(SqlType::Integer))
    )];
    where_parts.extend(active_clause(table));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        quoted(&table.name),
        sets.join(", "),
        where_parts.join(" AND "),
        projection(table, dialect)
    );
    q
}

/// DELETE by primary key, or clear the active flag for soft-delete tables. Already-inactive
/// rows are not touched, so a repeated delete affects zero rows.
pub fn delete(table: &TableDescriptor, dialect: Dialect, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    let pk_match = format!(
        "{} = {}",
        quoted(&table.primary_key),
        dialect.placeholder(n, Some(SqlType::Integer))
    );
    q.sql = match &table.delete_strategy {
        DeleteStrategy::Hard => format!("DELETE FROM {} WHERE {}", quoted(&table.name), pk_match),
        DeleteStrategy::Soft { flag_column } => format!(
            "UPDATE {} SET {} = 0 WHERE {} AND {} = 1",
            quoted(&table.name),
            quoted(flag_column),
            pk_match,
            quoted(flag_column)
        ),
    };
    q
}

/// SELECT the primary key of an active row; used to check references before a write.
pub fn select_active_key(table: &TableDescriptor, dialect: Dialect, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id.clone());
    let mut where_parts = vec![format!(
        "{} = {}",
        quoted(&table.primary_key),
        dialect.placeholder(n, Some(SqlType::Integer))
    )];
    where_parts.extend(active_clause(table));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        quoted(&table.primary_key),
        quoted(&table.name),
        where_parts.join(" AND ")
    );
    q
}

/// SELECT another row holding the same slot values. `values` follow `rule.columns` order.
pub fn select_slot_holder(
    table: &TableDescriptor,
    dialect: Dialect,
    rule: &SlotRule,
    values: &[Value],
    exclude_id: Option<i64>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, value) in rule.columns.iter().zip(values) {
        let n = q.push_param(value.clone());
        where_parts.push(format!(
            "{} = {}",
            quoted(col),
            dialect.placeholder(n, sql_type_of(table, col))
        ));
    }
    if let Some(id) = exclude_id {
        let n = q.push_param(Value::from(id));
        where_parts.push(format!(
            "{} <> {}",
            quoted(&table.primary_key),
            dialect.placeholder(n, Some(SqlType::Integer))
        ));
    }
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} LIMIT 1",
        quoted(&table.primary_key),
        quoted(&table.name),
        where_parts.join(" AND ")
    );
    q
}

/// Call a set-returning routine with named arguments: `SELECT * FROM "name"(arg => $1, ...)`.
pub fn call_routine(
    dialect: Dialect,
    routine: &str,
    args: &[(&str, Option<SqlType>, Value)],
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut parts = Vec::new();
    for (name, ty, value) in args {
        let n = q.push_param(value.clone());
        parts.push(format!("{} => {}", quoted(name), dialect.placeholder(n, *ty)));
    }
    q.sql = format!("SELECT * FROM {}({})", quoted(routine), parts.join(", "));
    q
}

/// SELECT every row of a catalog table, ordered by its first column.
pub fn select_catalog(entry: &CatalogEntry, dialect: Dialect) -> QueryBuf {
    let mut q = QueryBuf::new();
    let order = entry
        .columns
        .first()
        .map(|c| format!(" ORDER BY {}", quoted(&c.name)))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}",
        select_columns(&entry.columns, dialect),
        quoted(&entry.name),
        order
    );
    q
}

/// INSERT one row into the deletion audit table.
pub fn insert_audit(dialect: Dialect, table: &str, id: i64, user: Option<&str>, at: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let values = [
        (Value::from(table), SqlType::Text),
        (Value::from(id), SqlType::Integer),
        (user.map(Value::from).unwrap_or(Value::Null), SqlType::Text),
        (Value::from(at), SqlType::Text),
    ];
    let placeholders: Vec<String> = values
        .into_iter()
        .map(|(v, ty)| {
            let n = q.push_param(v);
            dialect.placeholder(n, Some(ty))
        })
        .collect();
    q.sql = format!(
        "INSERT INTO {} ({}, {}, {}, {}) VALUES ({})",
        quoted(super::AUDIT_TABLE),
        quoted("tabla"),
        quoted("registro_id"),
        quoted("usuario"),
        quoted("fecha_eliminacion"),
        placeholders.join(", ")
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn select_all_filters_soft_deleted_rows() {
        let reg = Registry::hospital().unwrap();
        let q = select_all(reg.describe("Pacientes").unwrap(), Dialect::Sqlite);
        assert_eq!(
            q.sql,
            r#"SELECT "ID", "nombre", "edad", "direccion", "telefono" FROM "Pacientes" WHERE "Estado" = 1 ORDER BY "ID""#
        );
        let q = select_all(reg.describe("Doctores").unwrap(), Dialect::Sqlite);
        assert_eq!(
            q.sql,
            r#"SELECT "ID", "nombre", "especialidad", "telefono" FROM "Doctores" ORDER BY "ID""#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn postgres_reads_dates_as_text() {
        let reg = Registry::hospital().unwrap();
        let q = select_by_id(reg.describe("Citas").unwrap(), Dialect::Postgres, 7);
        assert_eq!(
            q.sql,
            r#"SELECT "ID", "paciente_id", "doctor_id", "fecha"::text AS "fecha" FROM "Citas" WHERE "ID" = $1::integer"#
        );
        assert_eq!(q.params, vec![json!(7)]);
    }

    #[test]
    fn insert_binds_values_and_returns_projection() {
        let reg = Registry::hospital().unwrap();
        let t = reg.describe("Pacientes").unwrap();
        let q = insert(t, Dialect::Sqlite, &fields(&[("nombre", json!("Ana")), ("edad", json!(30))]));
        assert_eq!(
            q.sql,
            r#"INSERT INTO "Pacientes" ("nombre", "edad") VALUES ($1, $2) RETURNING "ID", "nombre", "edad", "direccion", "telefono""#
        );
        assert_eq!(q.params, vec![json!("Ana"), json!(30)]);

        let q = insert(t, Dialect::Postgres, &fields(&[("edad", json!(30))]));
        assert_eq!(
            q.sql,
            r#"INSERT INTO "Pacientes" ("edad") VALUES ($1::integer) RETURNING "ID", "nombre", "edad", "direccion", "telefono""#
        );
    }

    #[test]
    fn unknown_columns_never_reach_sql() {
        let reg = Registry::hospital().unwrap();
        let t = reg.describe("Doctores").unwrap();
        let q = insert(
            t,
            Dialect::Sqlite,
            &fields(&[("nombre", json!("House")), ("x\"; DROP TABLE Doctores; --", json!(1))]),
        );
        assert!(!q.sql.contains("DROP"));
        assert_eq!(q.params.len(), 1);
    }

    #[test]
    fn update_keys_on_primary_key_and_active_flag() {
        let reg = Registry::hospital().unwrap();
        let t = reg.describe("Pacientes").unwrap();
        let q = update(t, Dialect::Sqlite, 4, &fields(&[("telefono", json!("555"))]));
        assert_eq!(
            q.sql,
            r#"UPDATE "Pacientes" SET "telefono" = $1 WHERE "ID" = $2 AND "Estado" = 1 RETURNING "ID", "nombre", "edad", "direccion", "telefono""#
        );
        assert_eq!(q.params, vec![json!("555"), json!(4)]);
    }

    #[test]
    fn delete_follows_strategy() {
        let reg = Registry::hospital().unwrap();
        let q = delete(reg.describe("Pacientes").unwrap(), Dialect::Sqlite, 3);
        assert_eq!(
            q.sql,
            r#"UPDATE "Pacientes" SET "Estado" = 0 WHERE "ID" = $1 AND "Estado" = 1"#
        );
        let q = delete(reg.describe("Citas").unwrap(), Dialect::Postgres, 3);
        assert_eq!(q.sql, r#"DELETE FROM "Citas" WHERE "ID" = $1::integer"#);
        assert_eq!(q.params, vec![json!(3)]);
    }

    #[test]
    fn slot_holder_excludes_current_row() {
        let reg = Registry::hospital().unwrap();
        let t = reg.describe("Citas").unwrap();
        let rule = t.unique_slot.as_ref().unwrap();
        let q = select_slot_holder(t, Dialect::Postgres, rule, &[json!(2), json!("2024-01-01")], Some(1));
        assert_eq!(
            q.sql,
            r#"SELECT "ID" FROM "Citas" WHERE "doctor_id" = $1::integer AND "fecha" = $2::date AND "ID" <> $3::integer LIMIT 1"#
        );
    }

    #[test]
    fn routine_call_uses_named_arguments() {
        let q = call_routine(
            Dialect::Postgres,
            "sp_Doctores_Create",
            &[("nombre", Some(SqlType::Text), json!("House"))],
        );
        assert_eq!(q.sql, r#"SELECT * FROM "sp_Doctores_Create"("nombre" => $1::text)"#);
        let q = call_routine(Dialect::Postgres, "sp_Doctores_ReadAll", &[]);
        assert_eq!(q.sql, r#"SELECT * FROM "sp_Doctores_ReadAll"()"#);
    }
}
