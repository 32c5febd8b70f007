//! Table registry: logical table name -> primary key, writable fields and delete strategy.
//! Identifiers used in generated SQL come only from here, never from request input.

mod catalog;
mod types;
mod validator;

pub use catalog::{Catalog, CatalogEntry};
pub use types::*;
pub use validator::validate;

use crate::error::{AppError, ConfigError};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Registry {
    tables: Vec<TableDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn new(tables: Vec<TableDescriptor>) -> Result<Self, ConfigError> {
        validate(&tables)?;
        let by_name = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Ok(Registry { tables, by_name })
    }

    /// The CRUD-enabled hospital tables.
    pub fn hospital() -> Result<Self, ConfigError> {
        use SqlType::{Date, Integer, Text};
        Registry::new(vec![
            TableDescriptor::new(
                "Pacientes",
                "ID",
                vec![
                    FieldSpec::new("nombre", Text),
                    FieldSpec::new("edad", Integer),
                    FieldSpec::new("direccion", Text),
                    FieldSpec::new("telefono", Text),
                ],
            )
            .soft_delete("Estado"),
            TableDescriptor::new(
                "Doctores",
                "ID",
                vec![
                    FieldSpec::new("nombre", Text),
                    FieldSpec::new("especialidad", Text),
                    FieldSpec::new("telefono", Text),
                ],
            ),
            TableDescriptor::new(
                "Citas",
                "ID",
                vec![
                    FieldSpec::new("paciente_id", Integer),
                    FieldSpec::new("doctor_id", Integer),
                    FieldSpec::new("fecha", Date),
                ],
            )
            .reference("paciente_id", "Pacientes", "Paciente inválido")
            .reference("doctor_id", "Doctores", "Doctor inválido")
            .unique_slot(&["doctor_id", "fecha"], "El doctor ya tiene una cita a esa hora"),
        ])
    }

    /// Case-sensitive exact lookup.
    pub fn describe(&self, name: &str) -> Result<&TableDescriptor, AppError> {
        self.by_name
            .get(name)
            .map(|&i| &self.tables[i])
            .ok_or_else(|| AppError::UnknownTable {
                table: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hospital_registry_is_exactly_three_tables() {
        let reg = Registry::hospital().unwrap();
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["Pacientes", "Doctores", "Citas"]);
        let p = reg.describe("Pacientes").unwrap();
        assert_eq!(p.primary_key, "ID");
        let names: Vec<&str> = p.allowed_fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["nombre", "edad", "direccion", "telefono"]);
        assert_eq!(p.active_flag(), Some("Estado"));
        assert!(!p.allows("ID"));
        assert!(!p.allows("Estado"));
        assert_eq!(reg.describe("Doctores").unwrap().delete_strategy, DeleteStrategy::Hard);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let reg = Registry::hospital().unwrap();
        let err = reg.describe("pacientes").unwrap_err();
        assert!(matches!(err, AppError::UnknownTable { .. }));
        assert_eq!(
            err.to_string(),
            "Tabla no permitida. Usa: Pacientes, Doctores, Citas"
        );
        assert!(reg.describe("Pacientes; DROP TABLE Citas").is_err());
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        let bad = TableDescriptor::new("Pacientes", "ID", vec![FieldSpec::new("nombre\"--", SqlType::Text)]);
        assert!(matches!(Registry::new(vec![bad]), Err(ConfigError::InvalidIdentifier(_))));
    }

    #[test]
    fn rejects_primary_key_in_allowed_fields() {
        let bad = TableDescriptor::new("T", "ID", vec![FieldSpec::new("ID", SqlType::Integer)]);
        assert!(matches!(Registry::new(vec![bad]), Err(ConfigError::InvalidTable { .. })));
    }

    #[test]
    fn rejects_writable_soft_delete_flag() {
        let bad = TableDescriptor::new("T", "ID", vec![FieldSpec::new("Estado", SqlType::Integer)])
            .soft_delete("Estado");
        assert!(Registry::new(vec![bad]).is_err());
    }

    #[test]
    fn rejects_reference_to_unregistered_table() {
        let bad = TableDescriptor::new("T", "ID", vec![FieldSpec::new("x_id", SqlType::Integer)])
            .reference("x_id", "Missing", "bad");
        assert!(Registry::new(vec![bad]).is_err());
    }

    #[test]
    fn catalog_covers_all_bootstrap_tables() {
        let catalog = Catalog::hospital().unwrap();
        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Pacientes", "Doctores", "Citas", "Diagnosticos", "Seguros", "AuditoriaEliminar"]
        );
        assert!(catalog.get("Seguros").is_some());
        assert!(catalog.get("seguros").is_none());
    }
}
