use scopeql_scope::{CallContext, ScopeError, ScopeHook};

use crate::value::Value;

/// The execution façade's hook chain, spec §4.6: `Before` may rewrite or
/// reject the call; `After`/`OnError` are notifications only and cannot
/// themselves fail the call. Default no-ops let a hook implement only the
/// stage it cares about.
pub trait Hook {
    fn before(
        &self,
        ctx: CallContext,
        sql: &str,
        args: &[Value],
    ) -> Result<(CallContext, String, Vec<Value>), ScopeError>;

    fn after(&self, _ctx: &CallContext, _sql: &str, _args: &[Value]) {}

    fn on_error(&self, _ctx: &CallContext, _err: &DriverOrScopeError, _sql: &str, _args: &[Value]) {}
}

/// The error an `OnError` hook observes: either the `Before` hook rejected
/// the call, or the driver itself failed after `Before` allowed it through.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOrScopeError {
    Scope(ScopeError),
    Driver(crate::driver::DriverError),
}

impl std::fmt::Display for DriverOrScopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverOrScopeError::Scope(e) => write!(f, "{e}"),
            DriverOrScopeError::Driver(e) => write!(f, "{e}"),
        }
    }
}

impl Hook for ScopeHook<Value> {
    fn before(
        &self,
        ctx: CallContext,
        sql: &str,
        args: &[Value],
    ) -> Result<(CallContext, String, Vec<Value>), ScopeError> {
        ScopeHook::before(self, ctx, sql, args)
    }
}
