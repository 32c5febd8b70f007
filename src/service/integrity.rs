//! Pre-write checks driven by registry metadata: referenced rows must exist and slot columns
//! (doctor + date for Citas) must not already be taken by another row.

use crate::error::AppError;
use crate::gateway::Gateway;
use crate::registry::{Registry, TableDescriptor};
use crate::service::Projection;
use crate::sql;
use serde_json::Value;

/// Every referenced column present in `fields` must point at an active row of its target table.
pub async fn check_references(
    registry: &Registry,
    gateway: &Gateway,
    table: &TableDescriptor,
    fields: &Projection,
) -> Result<(), AppError> {
    for reference in &table.references {
        let Some(value) = fields.get(&reference.column) else { continue };
        if value.is_null() {
            continue;
        }
        let Some(id) = value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        else {
            return Err(AppError::Validation(reference.message.clone()));
        };
        let target = registry.describe(&reference.table)?;
        let q = sql::select_active_key(target, gateway.dialect(), &Value::from(id));
        if gateway.fetch_optional(&q).await?.is_none() {
            return Err(AppError::Validation(reference.message.clone()));
        }
    }
    Ok(())
}

/// Rejects the write with `Conflict` when another row already holds the same slot values.
/// `existing` is the id being updated; its current values fill slot columns the payload omits.
pub async fn check_slot(
    gateway: &Gateway,
    table: &TableDescriptor,
    fields: &Projection,
    existing: Option<i64>,
) -> Result<(), AppError> {
    let Some(rule) = &table.unique_slot else {
        return Ok(());
    };
    if !rule.columns.iter().any(|c| fields.get(c).is_some()) {
        return Ok(());
    }
    let current = match existing {
        Some(id) => {
            let q = sql::select_by_id(table, gateway.dialect(), id);
            Some(gateway.fetch_optional(&q).await?.ok_or(AppError::NotFound)?)
        }
        None => None,
    };
    let values = merged_slot(&rule.columns, fields, current.as_ref());
    if values.iter().any(Value::is_null) {
        return Ok(());
    }
    let q = sql::select_slot_holder(table, gateway.dialect(), rule, &values, existing);
    match gateway.fetch_optional(&q).await? {
        Some(_) => Err(AppError::Conflict(rule.message.clone())),
        None => Ok(()),
    }
}

/// Slot values in rule order: payload first, then the current row, else null.
fn merged_slot(columns: &[String], fields: &Projection, current: Option<&Value>) -> Vec<Value> {
    columns
        .iter()
        .map(|c| {
            fields
                .get(c)
                .or_else(|| current.and_then(|row| row.get(c)))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_wins_over_current_row() {
        let reg = Registry::hospital().unwrap();
        let citas = reg.describe("Citas").unwrap();
        let fields = Projection::from_body(citas, &json!({"fecha": "2024-01-01"})).unwrap();
        let current = json!({"ID": 1, "doctor_id": 2, "fecha": "2023-05-05", "paciente_id": 1});
        let cols = vec!["doctor_id".to_string(), "fecha".to_string()];
        assert_eq!(
            merged_slot(&cols, &fields, Some(&current)),
            vec![json!(2), json!("2024-01-01")]
        );
        assert_eq!(
            merged_slot(&cols, &fields, None),
            vec![Value::Null, json!("2024-01-01")]
        );
    }
}
