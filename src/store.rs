//! Schema bootstrap: `CREATE TABLE IF NOT EXISTS` for every hospital table, per dialect, plus
//! the unique indexes that back the registry's slot rules.

use crate::error::AppError;
use crate::gateway::Gateway;
use crate::registry::SqlType;
use crate::sql::{quoted, Dialect, AUDIT_TABLE};

struct ColumnDdl {
    name: &'static str,
    sql_type: SqlType,
    constraint: &'static str,
}

struct TableDdl {
    name: &'static str,
    primary_key: &'static str,
    columns: &'static [ColumnDdl],
    /// (column, referenced table); the referenced key is always "ID".
    foreign_keys: &'static [(&'static str, &'static str)],
    /// Column sets created as `CREATE UNIQUE INDEX IF NOT EXISTS`, so existing databases get them.
    unique: &'static [&'static [&'static str]],
}

const fn col(name: &'static str, sql_type: SqlType, constraint: &'static str) -> ColumnDdl {
    ColumnDdl {
        name,
        sql_type,
        constraint,
    }
}

/// Tables in creation order (referenced tables first).
const SCHEMA: &[TableDdl] = &[
    TableDdl {
        name: "Pacientes",
        primary_key: "ID",
        columns: &[
            col("nombre", SqlType::Text, "NOT NULL"),
            col("edad", SqlType::Integer, ""),
            col("direccion", SqlType::Text, ""),
            col("telefono", SqlType::Text, ""),
            col("Estado", SqlType::Integer, "NOT NULL DEFAULT 1"),
        ],
        foreign_keys: &[],
        unique: &[],
    },
    TableDdl {
        name: "Doctores",
        primary_key: "ID",
        columns: &[
            col("nombre", SqlType::Text, "NOT NULL"),
            col("especialidad", SqlType::Text, ""),
            col("telefono", SqlType::Text, ""),
        ],
        foreign_keys: &[],
        unique: &[],
    },
    TableDdl {
        name: "Citas",
        primary_key: "ID",
        columns: &[
            col("paciente_id", SqlType::Integer, ""),
            col("doctor_id", SqlType::Integer, ""),
            col("fecha", SqlType::Date, ""),
            col("hora", SqlType::Text, ""),
        ],
        foreign_keys: &[("paciente_id", "Pacientes"), ("doctor_id", "Doctores")],
        unique: &[&["doctor_id", "fecha"]],
    },
    TableDdl {
        name: "Diagnosticos",
        primary_key: "ID",
        columns: &[
            col("cita_id", SqlType::Integer, ""),
            col("diagnostico", SqlType::Text, ""),
            col("tratamiento", SqlType::Text, ""),
        ],
        foreign_keys: &[("cita_id", "Citas")],
        unique: &[],
    },
    TableDdl {
        name: "Seguros",
        primary_key: "id_seguro",
        columns: &[
            col("tipo", SqlType::Text, ""),
            col("compania", SqlType::Text, ""),
            col("id_paciente", SqlType::Integer, ""),
        ],
        foreign_keys: &[("id_paciente", "Pacientes")],
        unique: &[],
    },
    TableDdl {
        name: AUDIT_TABLE,
        primary_key: "ID",
        columns: &[
            col("tabla", SqlType::Text, "NOT NULL"),
            col("registro_id", SqlType::Integer, "NOT NULL"),
            col("usuario", SqlType::Text, ""),
            col("fecha_eliminacion", SqlType::Text, "NOT NULL"),
        ],
        foreign_keys: &[],
        unique: &[],
    },
];

fn create_table_sql(table: &TableDdl, dialect: Dialect) -> String {
    let mut defs = vec![format!(
        "{} {}",
        quoted(table.primary_key),
        dialect.serial_primary_key()
    )];
    for c in table.columns {
        let mut def = format!("{} {}", quoted(c.name), dialect.column_type(c.sql_type));
        if !c.constraint.is_empty() {
            def.push(' ');
            def.push_str(c.constraint);
        }
        defs.push(def);
    }
    for (column, target) in table.foreign_keys {
        defs.push(format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            quoted(column),
            quoted(target),
            quoted("ID")
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(table.name),
        defs.join(", ")
    )
}

fn unique_index_sql(table: &TableDdl, columns: &[&str]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quoted(c)).collect();
    format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
        quoted(&format!("ux_{}_{}", table.name, columns.join("_"))),
        quoted(table.name),
        cols.join(", ")
    )
}

/// Create any missing hospital table and unique index. Existing tables are left untouched.
pub async fn ensure_schema(gateway: &Gateway) -> Result<(), AppError> {
    let dialect = gateway.dialect();
    for table in SCHEMA {
        gateway.execute(&create_table_sql(table, dialect), &[]).await?;
        for columns in table.unique {
            gateway.execute(&unique_index_sql(table, columns), &[]).await?;
        }
    }
    tracing::info!(tables = SCHEMA.len(), "schema ensured");
    Ok(())
}
