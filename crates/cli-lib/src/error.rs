use thiserror::Error;

use crate::driver::DriverError;
use scopeql_compiler::{BindError, CompileError};
use scopeql_scope::ScopeError;

/// The façade's top-level error: composes every failure mode a caller of
/// `exec_named`/`query_named` can hit, so they can `?` across subsystem
/// boundaries without manual wrapping (spec §7).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FacadeError {
    #[error("compiling named parameters: {0}")]
    Compile(#[from] CompileError),
    #[error("binding named parameters: {0}")]
    Bind(#[from] BindError),
    #[error("before hook rejected the call: {0}")]
    Scope(#[from] ScopeError),
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}
