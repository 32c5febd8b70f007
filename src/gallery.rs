//! Query gallery: fixed read-only analytical statements exposed by name.
//!
//! Statements are written once for both engines: mixed-case identifiers are quoted, dates are
//! cast to text and every non-aggregated column appears in GROUP BY.

use crate::error::AppError;
use crate::gateway::Gateway;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct GalleryEntry {
    pub name: &'static str,
    pub titulo: &'static str,
    pub descripcion: &'static str,
    #[serde(skip)]
    pub sql: &'static str,
}

pub const GALLERY: &[GalleryEntry] = &[
    GalleryEntry {
        name: "pacientes-citas",
        titulo: "Pacientes con Citas (INNER JOIN)",
        descripcion: "Unión de pacientes, citas, doctores y diagnósticos",
        sql: r#"SELECT p."ID" AS paciente_id, p.nombre AS paciente_nombre, p.edad,
       d.nombre AS doctor_nombre, d.especialidad,
       CAST(c.fecha AS TEXT) AS fecha, c.hora, dg.diagnostico, dg.tratamiento
FROM "Pacientes" p
INNER JOIN "Citas" c ON p."ID" = c.paciente_id
INNER JOIN "Doctores" d ON c.doctor_id = d."ID"
LEFT JOIN "Diagnosticos" dg ON c."ID" = dg.cita_id
WHERE p."Estado" = 1
ORDER BY c.fecha DESC, c."ID" DESC"#,
    },
    GalleryEntry {
        name: "doctores-estadisticas",
        titulo: "Estadísticas de Doctores (GROUP BY)",
        descripcion: "Pacientes distintos y cantidad de citas por doctor",
        sql: r#"SELECT d."ID", d.nombre, d.especialidad,
       COUNT(DISTINCT c.paciente_id) AS total_pacientes, COUNT(c."ID") AS total_citas
FROM "Doctores" d
LEFT JOIN "Citas" c ON d."ID" = c.doctor_id
GROUP BY d."ID", d.nombre, d.especialidad
ORDER BY total_citas DESC, d."ID""#,
    },
    GalleryEntry {
        name: "pacientes-sin-citas",
        titulo: "Pacientes sin Citas (Subconsulta NOT IN)",
        descripcion: "Pacientes activos que no tienen citas asignadas",
        sql: r#"SELECT p."ID", p.nombre, p.edad, p.telefono, p.direccion
FROM "Pacientes" p
WHERE p."ID" NOT IN (SELECT DISTINCT paciente_id FROM "Citas" WHERE paciente_id IS NOT NULL)
  AND p."Estado" = 1
ORDER BY p."ID""#,
    },
    GalleryEntry {
        name: "citas-proximas",
        titulo: "Citas Próximas (ORDER BY)",
        descripcion: "Próximas 10 citas a partir de hoy",
        sql: r#"SELECT c."ID", p.nombre AS paciente, d.nombre AS doctor, d.especialidad,
       CAST(c.fecha AS TEXT) AS fecha, c.hora
FROM "Citas" c
INNER JOIN "Pacientes" p ON c.paciente_id = p."ID"
INNER JOIN "Doctores" d ON c.doctor_id = d."ID"
WHERE c.fecha >= CURRENT_DATE
ORDER BY c.fecha ASC, c.hora ASC
LIMIT 10"#,
    },
    GalleryEntry {
        name: "diagnosticos-especialidad",
        titulo: "Diagnósticos por Especialidad (GROUP BY)",
        descripcion: "Frecuencia de cada diagnóstico por especialidad",
        sql: r#"SELECT d.especialidad, dg.diagnostico, COUNT(*) AS frecuencia
FROM "Diagnosticos" dg
INNER JOIN "Citas" c ON dg.cita_id = c."ID"
INNER JOIN "Doctores" d ON c.doctor_id = d."ID"
WHERE dg.diagnostico IS NOT NULL
GROUP BY d.especialidad, dg.diagnostico
ORDER BY d.especialidad, frecuencia DESC"#,
    },
    GalleryEntry {
        name: "auditoria",
        titulo: "Auditoría de Eliminaciones",
        descripcion: "Últimos 100 registros eliminados",
        sql: r#"SELECT "ID", tabla, registro_id, usuario, fecha_eliminacion
FROM "AuditoriaEliminar"
ORDER BY "ID" DESC
LIMIT 100"#,
    },
];

pub fn find(name: &str) -> Option<&'static GalleryEntry> {
    GALLERY.iter().find(|e| e.name == name)
}

/// Run one gallery statement by name. Unknown names are `NotFound`.
pub async fn run(gateway: &Gateway, name: &str) -> Result<(&'static GalleryEntry, Vec<Value>), AppError> {
    let entry = find(name).ok_or(AppError::NotFound)?;
    let rows = gateway.query(entry.sql, &[]).await?;
    Ok((entry, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_statements_read_only() {
        let names: HashSet<_> = GALLERY.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), GALLERY.len());
        for e in GALLERY {
            assert!(e.sql.trim_start().starts_with("SELECT"), "{}", e.name);
            assert!(!e.sql.contains(';'), "{}", e.name);
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert!(find("citas-proximas").is_some());
        assert!(find("Citas-Proximas").is_none());
    }
}
