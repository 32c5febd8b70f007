//! Browse-only metadata for every table in the hospital schema, CRUD-enabled or not.

use crate::error::ConfigError;
use crate::registry::validator::{check_identifier, identifier_regex};
use crate::registry::{FieldSpec, SqlType};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub columns: Vec<FieldSpec>,
}

impl CatalogEntry {
    fn new(name: &str, description: &str, columns: &[(&str, SqlType)]) -> Self {
        CatalogEntry {
            name: name.to_string(),
            description: description.to_string(),
            columns: columns.iter().map(|(n, t)| FieldSpec::new(n, *t)).collect(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, ConfigError> {
        let re = identifier_regex()?;
        let mut by_name = HashMap::new();
        for (i, e) in entries.iter().enumerate() {
            check_identifier(&re, &e.name)?;
            if e.columns.is_empty() {
                return Err(ConfigError::InvalidTable {
                    table: e.name.clone(),
                    reason: "no columns".into(),
                });
            }
            for c in &e.columns {
                check_identifier(&re, &c.name)?;
            }
            if by_name.insert(e.name.clone(), i).is_some() {
                return Err(ConfigError::InvalidTable {
                    table: e.name.clone(),
                    reason: "duplicate table".into(),
                });
            }
        }
        Ok(Catalog { entries, by_name })
    }

    /// All tables created by the schema bootstrap.
    pub fn hospital() -> Result<Self, ConfigError> {
        use SqlType::{Date, Integer, Text};
        Catalog::new(vec![
            CatalogEntry::new(
                "Pacientes",
                "Información de pacientes del hospital",
                &[
                    ("ID", Integer),
                    ("nombre", Text),
                    ("edad", Integer),
                    ("direccion", Text),
                    ("telefono", Text),
                    ("Estado", Integer),
                ],
            ),
            CatalogEntry::new(
                "Doctores",
                "Información de doctores y especialidades",
                &[("ID", Integer), ("nombre", Text), ("especialidad", Text), ("telefono", Text)],
            ),
            CatalogEntry::new(
                "Citas",
                "Registro de citas médicas",
                &[
                    ("ID", Integer),
                    ("paciente_id", Integer),
                    ("doctor_id", Integer),
                    ("fecha", Date),
                    ("hora", Text),
                ],
            ),
            CatalogEntry::new(
                "Diagnosticos",
                "Diagnósticos y tratamientos médicos",
                &[("ID", Integer), ("cita_id", Integer), ("diagnostico", Text), ("tratamiento", Text)],
            ),
            CatalogEntry::new(
                "Seguros",
                "Seguros médicos de pacientes",
                &[("id_seguro", Integer), ("tipo", Text), ("compania", Text), ("id_paciente", Integer)],
            ),
            CatalogEntry::new(
                "AuditoriaEliminar",
                "Registros de auditoría de eliminaciones",
                &[
                    ("ID", Integer),
                    ("tabla", Text),
                    ("registro_id", Integer),
                    ("usuario", Text),
                    ("fecha_eliminacion", Text),
                ],
            ),
        ])
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }
}
