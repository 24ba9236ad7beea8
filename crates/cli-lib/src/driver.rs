use thiserror::Error;

use crate::value::Value;

/// A driver-reported name, mapped to a placeholder [`scopeql_compiler::Dialect`]
/// the same way a real driver's connection string or crate name would be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverHint(pub String);

impl DriverHint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn dialect(&self) -> scopeql_compiler::Dialect {
        scopeql_compiler::Dialect::from_driver_hint(&self.0).unwrap_or(scopeql_compiler::Dialect::Unknown)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("no table named {0:?}")]
    UnknownTable(String),
    #[error("prepared statement {0:?} was never prepared")]
    UnknownStatement(String),
}

/// The execution façade's driver-side contract, spec §4.6: `Prepare`,
/// `Exec`, `Query`, `DriverName`. One row is an ordered list of values; a
/// real driver would return something richer (column metadata, streaming),
/// but the façade only needs enough shape to prove the hook chain runs.
pub trait Driver {
    fn driver_name(&self) -> DriverHint;
    fn prepare(&self, sql: &str) -> Result<String, DriverError>;
    fn exec(&self, sql: &str, args: &[Value]) -> Result<u64, DriverError>;
    fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Vec<Value>>, DriverError>;
}
