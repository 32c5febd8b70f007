//! Resolved table descriptors: the whitelist every SQL identifier is taken from.

use std::collections::HashMap;

/// Column type used for dialect casts and DDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
    Date,
}

impl SqlType {
    /// PostgreSQL type name for `$n::type` casts.
    pub fn pg_name(self) -> &'static str {
        match self {
            SqlType::Integer => "integer",
            SqlType::Text => "text",
            SqlType::Date => "date",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub sql_type: SqlType,
}

impl FieldSpec {
    pub fn new(name: &str, sql_type: SqlType) -> Self {
        FieldSpec {
            name: name.to_string(),
            sql_type,
        }
    }
}

/// How `remove` treats a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteStrategy {
    Hard,
    /// Rows stay in place with `flag_column = 0`; reads only see `flag_column = 1`.
    Soft { flag_column: String },
}

/// A column that must point at an existing (and active) row of another registered table.
#[derive(Clone, Debug)]
pub struct Reference {
    pub column: String,
    pub table: String,
    pub message: String,
}

/// Columns whose combined values may appear in at most one row (e.g. doctor + date).
#[derive(Clone, Debug)]
pub struct SlotRule {
    pub columns: Vec<String>,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct TableDescriptor {
    pub name: String,
    pub primary_key: String,
    pub allowed_fields: Vec<FieldSpec>,
    pub delete_strategy: DeleteStrategy,
    pub references: Vec<Reference>,
    pub unique_slot: Option<SlotRule>,
    field_index: HashMap<String, usize>,
}

impl TableDescriptor {
    pub fn new(name: &str, primary_key: &str, allowed_fields: Vec<FieldSpec>) -> Self {
        let field_index = allowed_fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        TableDescriptor {
            name: name.to_string(),
            primary_key: primary_key.to_string(),
            allowed_fields,
            delete_strategy: DeleteStrategy::Hard,
            references: Vec::new(),
            unique_slot: None,
            field_index,
        }
    }

    pub fn soft_delete(mut self, flag_column: &str) -> Self {
        self.delete_strategy = DeleteStrategy::Soft {
            flag_column: flag_column.to_string(),
        };
        self
    }

    pub fn reference(mut self, column: &str, table: &str, message: &str) -> Self {
        self.references.push(Reference {
            column: column.to_string(),
            table: table.to_string(),
            message: message.to_string(),
        });
        self
    }

    pub fn unique_slot(mut self, columns: &[&str], message: &str) -> Self {
        self.unique_slot = Some(SlotRule {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            message: message.to_string(),
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.field_index.get(name).map(|&i| &self.allowed_fields[i])
    }

    pub fn allows(&self, name: &str) -> bool {
        self.field_index.contains_key(name)
    }

    /// Soft-delete flag column, when reads must be restricted to active rows.
    pub fn active_flag(&self) -> Option<&str> {
        match &self.delete_strategy {
            DeleteStrategy::Hard => None,
            DeleteStrategy::Soft { flag_column } => Some(flag_column),
        }
    }
}
