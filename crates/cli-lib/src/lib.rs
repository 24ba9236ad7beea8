//! A minimal execution façade (spec §4.6) wired over an in-memory driver,
//! so `scopeql-compiler` and `scopeql-scope` are reachable end-to-end from
//! a single call site instead of only as library crates. Not a real driver
//! integration: the in-memory driver owns no SQL execution semantics, only
//! enough table lookup to prove the `Before`/`After`/`OnError` chain runs.

mod driver;
mod error;
mod facade;
mod hooks;
mod memory;
mod value;

pub use driver::{Driver, DriverError, DriverHint};
pub use error::FacadeError;
pub use facade::Facade;
pub use hooks::{DriverOrScopeError, Hook};
pub use memory::MemoryDriver;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scopeql_compiler::MapBinder;
    use scopeql_helpers::{Config, IndexMap};
    use scopeql_scope::{CallContext, HookConfig, ScopeHook, ScopeRegistry, ScopeRule};

    fn tenant_scoped_facade() -> Facade<MemoryDriver> {
        let mut registry: ScopeRegistry<Value> = ScopeRegistry::new();
        registry.register(
            ScopeRule::new("orders")
                .column("tenant_id")
                .resolver(|_ctx| Ok(vec![Value::Int(7)])),
        );
        let hook = ScopeHook::new(registry, HookConfig::default());
        let driver = MemoryDriver::new("postgres").with_table(
            "orders",
            vec![vec![Value::Int(1), Value::Int(7)], vec![Value::Int(2), Value::Int(7)]],
        );
        Facade::new(driver).with_hook(hook)
    }

    #[test]
    fn query_named_compiles_binds_scopes_and_dispatches() {
        let facade = tenant_scoped_facade();
        let mut values = IndexMap::default();
        values.insert("paid".to_string(), Value::Bool(true));
        let binder = MapBinder::new(&values);

        let rows = facade
            .query_named(
                CallContext::new().with_driver_hint("postgres"),
                "SELECT id, tenant_id FROM orders WHERE paid = :paid",
                &binder,
            )
            .unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn before_rejection_skips_dispatch() {
        let mut registry: ScopeRegistry<Value> = ScopeRegistry::new();
        registry.register(ScopeRule::new("orders").column("tenant_id").resolver(|_ctx| Ok(vec![Value::Int(7)])));
        let config = HookConfig::default().config(|c| c.strict_all_tables = true);
        let hook = ScopeHook::new(registry, config);
        let driver = MemoryDriver::new("postgres").with_table("orders", vec![]);
        let facade = Facade::new(driver).with_hook(hook);

        let values: IndexMap<String, Value> = IndexMap::default();
        let binder = MapBinder::new(&values);
        let err = facade
            .query_named(
                CallContext::new().with_driver_hint("postgres"),
                "SELECT id FROM untracked_table",
                &binder,
            )
            .unwrap_err();

        assert!(matches!(err, FacadeError::Scope(_)));
    }

    #[test]
    fn unknown_table_surfaces_as_driver_error() {
        let driver = MemoryDriver::new("postgres");
        let facade = Facade::new(driver);
        let values: IndexMap<String, Value> = IndexMap::default();
        let binder = MapBinder::new(&values);

        let err = facade
            .query_named(CallContext::new(), "SELECT * FROM ghosts", &binder)
            .unwrap_err();
        assert!(matches!(err, FacadeError::Driver(_)));
    }
}
