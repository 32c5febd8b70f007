//! Request validation: id parsing and payload projection onto a table's allowed fields.

use crate::error::AppError;
use crate::registry::{FieldSpec, SqlType, TableDescriptor};
use chrono::NaiveDate;
use serde_json::Value;

/// Path ids must be integers.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("id inválido: {}", raw)))
}

/// Request body restricted to the table's allowed fields, in registry order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    fields: Vec<(String, Value)>,
}

impl Projection {
    /// Keeps only allowed fields; unknown keys are dropped without error. Allowed fields must hold
    /// `null` or a scalar of the column's type, which is normalized: integers may arrive as
    /// numeric strings, dates must be `YYYY-MM-DD`, text accepts numbers and booleans.
    pub fn from_body(table: &TableDescriptor, body: &Value) -> Result<Self, AppError> {
        let Value::Object(map) = body else {
            return Err(AppError::Validation("el cuerpo debe ser un objeto JSON".into()));
        };
        let mut fields = Vec::new();
        for f in &table.allowed_fields {
            let Some(v) = map.get(&f.name) else { continue };
            fields.push((f.name.clone(), coerce(f, v)?));
        }
        Ok(Projection { fields })
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn coerce(field: &FieldSpec, v: &Value) -> Result<Value, AppError> {
    let invalid = |expected: &str| {
        AppError::Validation(format!("{} debe ser {}", field.name, expected))
    };
    match (field.sql_type, v) {
        (_, Value::Null) => Ok(Value::Null),
        (_, Value::Array(_) | Value::Object(_)) => Err(invalid("un valor escalar")),
        (SqlType::Integer, Value::Number(n)) => n
            .as_i64()
            .map(Value::from)
            .ok_or_else(|| invalid("un número entero")),
        (SqlType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("un número entero")),
        (SqlType::Integer, Value::Bool(_)) => Err(invalid("un número entero")),
        (SqlType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| invalid("una fecha AAAA-MM-DD")),
        (SqlType::Date, _) => Err(invalid("una fecha AAAA-MM-DD")),
        (SqlType::Text, Value::String(_)) => Ok(v.clone()),
        (SqlType::Text, Value::Number(_) | Value::Bool(_)) => Ok(Value::String(v.to_string())),
    }
}
