//! Convert serde_json::Value to types the sqlx Any driver can bind.

use serde_json::Value;
use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;

/// A value that can be bound to a query on any supported engine.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
}

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else {
                    BindValue::F64(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Text(v.to_string()),
        }
    }
}

pub type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

pub fn bind_value(query: AnyQuery<'_>, v: BindValue) -> AnyQuery<'_> {
    match v {
        BindValue::Null => query.bind(Option::<String>::None),
        BindValue::Bool(b) => query.bind(b),
        BindValue::I64(n) => query.bind(n),
        BindValue::F64(n) => query.bind(n),
        BindValue::Text(s) => query.bind(s),
    }
}

pub fn bind_all<'q>(mut query: AnyQuery<'q>, params: &[Value]) -> AnyQuery<'q> {
    for p in params {
        query = bind_value(query, BindValue::from_json(p));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_map_to_bind_values() {
        assert_eq!(BindValue::from_json(&json!(null)), BindValue::Null);
        assert_eq!(BindValue::from_json(&json!(30)), BindValue::I64(30));
        assert_eq!(BindValue::from_json(&json!(1.5)), BindValue::F64(1.5));
        assert_eq!(BindValue::from_json(&json!(true)), BindValue::Bool(true));
        assert_eq!(BindValue::from_json(&json!("Ana")), BindValue::Text("Ana".into()));
    }
}
