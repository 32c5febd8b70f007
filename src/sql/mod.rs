//! Safe SQL builder: identifiers from the registry only, values as parameters.

mod builder;
mod dialect;
pub mod params;
pub use builder::*;
pub use dialect::Dialect;
pub use params::*;

/// Table that receives one row per successful delete.
pub const AUDIT_TABLE: &str = "AuditoriaEliminar";

/// Quote an identifier (safe: only from the registry or static catalog).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
