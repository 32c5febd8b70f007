//! CRUD service: dispatcher, executor chain and request validation.

mod dispatcher;
mod executor;
mod integrity;
mod procedure;
mod raw;
mod validation;
pub use dispatcher::{DispatchOptions, Dispatcher, OperationOutcome};
pub use executor::{Attempt, Executor};
pub use integrity::{check_references, check_slot};
pub use procedure::{ProcedureExecutor, Routine};
pub use raw::RawSqlExecutor;
pub use validation::{parse_id, Projection};
