use scopeql_compiler::{compile, Bind};
use scopeql_scope::CallContext;

use crate::driver::{Driver, DriverError};
use crate::error::FacadeError;
use crate::hooks::{DriverOrScopeError, Hook};
use crate::value::Value;

/// The execution façade, spec §4.6: a plain forwarder to a [`Driver`] that
/// (1) compiles named-parameter SQL for the driver's dialect and (2) runs
/// the registered hook chain's `Before`/`After`/`OnError` around dispatch.
/// Hooks run in registration order; `Before` may rewrite `(ctx, sql, args)`
/// for the next hook in the chain, and a rejection from any hook skips
/// execution entirely.
pub struct Facade<D> {
    driver: D,
    hooks: Vec<Box<dyn Hook>>,
}

impl<D: Driver> Facade<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    fn run_before(
        &self,
        mut ctx: CallContext,
        sql: &str,
        args: &[Value],
    ) -> Result<(CallContext, String, Vec<Value>), FacadeError> {
        let mut sql = sql.to_string();
        let mut args = args.to_vec();
        for hook in &self.hooks {
            match hook.before(ctx.clone(), &sql, &args) {
                Ok((new_ctx, new_sql, new_args)) => {
                    ctx = new_ctx;
                    sql = new_sql;
                    args = new_args;
                }
                Err(err) => {
                    log::warn!("before hook rejected query: {err}");
                    let failure = DriverOrScopeError::Scope(err.clone());
                    for h in &self.hooks {
                        h.on_error(&ctx, &failure, &sql, &args);
                    }
                    return Err(FacadeError::from(err));
                }
            }
        }
        Ok((ctx, sql, args))
    }

    fn run_after(&self, ctx: &CallContext, sql: &str, args: &[Value]) {
        for hook in &self.hooks {
            hook.after(ctx, sql, args);
        }
    }

    fn run_on_error(&self, ctx: &CallContext, err: &DriverError, sql: &str, args: &[Value]) {
        log::warn!("driver dispatch failed: {err}");
        let failure = DriverOrScopeError::Driver(err.clone());
        for hook in &self.hooks {
            hook.on_error(ctx, &failure, sql, args);
        }
    }

    /// Compiles `named_sql`'s `:name` placeholders for the driver's
    /// dialect, binds values via `binder`, runs the hook chain, and
    /// dispatches an `Exec` to the driver.
    pub fn exec_named(
        &self,
        ctx: CallContext,
        named_sql: &str,
        binder: &dyn Bind<Value>,
    ) -> Result<u64, FacadeError> {
        let dialect = self.driver.driver_name().dialect();
        let (sql, names) = compile(named_sql, dialect)?;
        let args = binder.bind(&names)?;
        let (ctx, sql, args) = self.run_before(ctx, &sql, &args)?;
        match self.driver.exec(&sql, &args) {
            Ok(n) => {
                self.run_after(&ctx, &sql, &args);
                Ok(n)
            }
            Err(err) => {
                self.run_on_error(&ctx, &err, &sql, &args);
                Err(FacadeError::from(err))
            }
        }
    }

    /// As [`Self::exec_named`], dispatching a `Query` instead of an `Exec`.
    pub fn query_named(
        &self,
        ctx: CallContext,
        named_sql: &str,
        binder: &dyn Bind<Value>,
    ) -> Result<Vec<Vec<Value>>, FacadeError> {
        let dialect = self.driver.driver_name().dialect();
        let (sql, names) = compile(named_sql, dialect)?;
        let args = binder.bind(&names)?;
        let (ctx, sql, args) = self.run_before(ctx, &sql, &args)?;
        match self.driver.query(&sql, &args) {
            Ok(rows) => {
                self.run_after(&ctx, &sql, &args);
                Ok(rows)
            }
            Err(err) => {
                self.run_on_error(&ctx, &err, &sql, &args);
                Err(FacadeError::from(err))
            }
        }
    }
}
