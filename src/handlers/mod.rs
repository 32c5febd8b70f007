//! HTTP handlers for registry CRUD, the query gallery and the table catalog.

pub mod catalog;
pub mod crud;
pub mod gallery;
