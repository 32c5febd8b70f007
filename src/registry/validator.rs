//! Registry validation: identifier safety and descriptor consistency.

use crate::error::ConfigError;
use crate::registry::TableDescriptor;
use regex::Regex;
use std::collections::HashSet;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

pub(crate) fn identifier_regex() -> Result<Regex, ConfigError> {
    Regex::new(IDENTIFIER_PATTERN).map_err(|_| ConfigError::InvalidIdentifier(IDENTIFIER_PATTERN.into()))
}

pub(crate) fn check_identifier(re: &Regex, ident: &str) -> Result<(), ConfigError> {
    if re.is_match(ident) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(ident.to_string()))
    }
}

fn invalid(table: &TableDescriptor, reason: String) -> ConfigError {
    ConfigError::InvalidTable {
        table: table.name.clone(),
        reason,
    }
}

pub fn validate(tables: &[TableDescriptor]) -> Result<(), ConfigError> {
    let re = identifier_regex()?;
    let mut names = HashSet::new();
    for t in tables {
        if !names.insert(t.name.as_str()) {
            return Err(invalid(t, "duplicate table".into()));
        }
    }

    for t in tables {
        check_identifier(&re, &t.name)?;
        check_identifier(&re, &t.primary_key)?;
        if t.allowed_fields.is_empty() {
            return Err(invalid(t, "no allowed fields".into()));
        }
        let mut seen = HashSet::new();
        for f in &t.allowed_fields {
            check_identifier(&re, &f.name)?;
            if f.name == t.primary_key {
                return Err(invalid(t, format!("primary key {} listed as allowed field", f.name)));
            }
            if !seen.insert(f.name.as_str()) {
                return Err(invalid(t, format!("duplicate field {}", f.name)));
            }
        }
        if let Some(flag) = t.active_flag() {
            check_identifier(&re, flag)?;
            if flag == t.primary_key || t.allows(flag) {
                return Err(invalid(t, format!("soft-delete flag {} must not be writable", flag)));
            }
        }
        for r in &t.references {
            if !t.allows(&r.column) {
                return Err(invalid(t, format!("reference column {} is not an allowed field", r.column)));
            }
            if !names.contains(r.table.as_str()) {
                return Err(invalid(t, format!("reference to unregistered table {}", r.table)));
            }
        }
        if let Some(slot) = &t.unique_slot {
            if slot.columns.is_empty() {
                return Err(invalid(t, "empty slot rule".into()));
            }
            if let Some(c) = slot.columns.iter().find(|c| !t.allows(c)) {
                return Err(invalid(t, format!("slot column {} is not an allowed field", c)));
            }
        }
    }
    Ok(())
}
