use crate::audit::{Action, AuditDecision, AuditSink};
use crate::config::HookConfig;
use crate::context::{CallContext, TrustedBypass};
use crate::engine::{classify_statement_type, rewrite_query};
use crate::error::{DenyCode, ScopeError};
use crate::rule::{Resolver, ScopeRegistry};

/// The resource-scope `Before` hook: the public entry point implementing
/// spec §4.3. One instance is built per application, wrapping an immutable
/// rule registry and configuration; `before` is called once per query,
/// concurrently, with no shared mutable state beyond the audit sink.
pub struct ScopeHook<V> {
    registry: ScopeRegistry<V>,
    config: HookConfig,
    default_resolver: Option<Resolver<V>>,
    audit_sink: Option<AuditSink>,
}

impl<V> ScopeHook<V> {
    pub fn new(registry: ScopeRegistry<V>, config: HookConfig) -> Self {
        Self {
            registry,
            config,
            default_resolver: None,
            audit_sink: None,
        }
    }

    pub fn with_default_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&CallContext) -> Result<Vec<V>, ScopeError> + Send + Sync + 'static,
    {
        self.default_resolver = Some(Box::new(f));
        self
    }

    pub fn with_audit_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&CallContext, &AuditDecision) + Send + Sync + 'static,
    {
        self.audit_sink = Some(Box::new(sink));
        self
    }

    fn emit(&self, ctx: &CallContext, decision: AuditDecision) {
        if let Some(sink) = &self.audit_sink {
            sink(ctx, &decision);
        }
    }

    fn reject(&self, ctx: &CallContext, sql: &str, code: DenyCode, message: &str) -> ScopeError {
        let err = ScopeError::new(code, message);
        self.emit(
            ctx,
            AuditDecision {
                action: Some(Action::Rejected),
                reason_code: Some(code),
                reason: Some(err.to_string()),
                statement_type: Some(classify_statement_type(sql).as_str().to_string()),
                final_query: sql.to_string(),
                ..AuditDecision::new()
            },
        );
        err
    }

    /// Implements the execution façade's `Before` hook: given the ambient
    /// context, SQL text, and positional argument sequence, returns the
    /// possibly-rewritten query and arguments, or a [`ScopeError`] that
    /// aborts the call.
    pub fn before(
        &self,
        ctx: CallContext,
        sql: &str,
        args: &[V],
    ) -> Result<(CallContext, String, Vec<V>), ScopeError>
    where
        V: Clone,
    {
        if let Some(bypass) = &ctx.bypass {
            if !self.config.allow_trusted_bypass || !bypass.trusted {
                return Err(self.reject(&ctx, sql, DenyCode::BypassNotAllowed, "trusted bypass is not permitted"));
            }
            if bypass.reason.is_empty() {
                return Err(self.reject(&ctx, sql, DenyCode::BypassMissingReason, "bypass reason is required"));
            }
            if self.config.require_bypass_token && !self.config.contains_bypass_token(sql) {
                return Err(self.reject(
                    &ctx,
                    sql,
                    DenyCode::BypassTokenRequired,
                    "query does not contain the required bypass token",
                ));
            }
            self.emit(
                &ctx,
                AuditDecision {
                    action: Some(Action::Bypassed),
                    statement_type: Some(classify_statement_type(sql).as_str().to_string()),
                    final_query: sql.to_string(),
                    ..AuditDecision::new()
                },
            );
            return Ok((ctx, sql.to_string(), args.to_vec()));
        }

        if self.config.contains_bypass_token(sql) {
            return Err(self.reject(
                &ctx,
                sql,
                DenyCode::BypassNotAllowed,
                "query contains the bypass token but the call context is not trusted",
            ));
        }

        match rewrite_query(&ctx, sql, args, &self.registry, &self.config, self.default_resolver.as_ref()) {
            Ok(outcome) => {
                let action = if outcome.any_scoped {
                    Action::Scoped
                } else {
                    Action::Passthrough
                };
                self.emit(
                    &ctx,
                    AuditDecision {
                        action: Some(action),
                        statement_type: outcome.statement_type.map(|s| s.to_string()),
                        matched_tables: outcome.matched_tables,
                        applied_rules: outcome.applied_rules,
                        added_predicate_count: outcome.added_predicate_count,
                        final_query: outcome.sql.clone(),
                        ..AuditDecision::new()
                    },
                );
                Ok((ctx, outcome.sql, outcome.args))
            }
            Err(err) => {
                self.emit(
                    &ctx,
                    AuditDecision {
                        action: Some(Action::Rejected),
                        reason_code: Some(err.code),
                        reason: Some(err.message.clone()),
                        statement_type: Some(classify_statement_type(sql).as_str().to_string()),
                        final_query: sql.to_string(),
                        ..AuditDecision::new()
                    },
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::ScopeRule;
    use pretty_assertions::assert_eq;
    use scopeql_helpers::Config;

    #[derive(Debug, Clone, PartialEq)]
    enum Val {
        Bool(bool),
        Int(i64),
    }

    fn orders_rule() -> ScopeRule<Val> {
        ScopeRule::new("orders")
            .column("tenant_id")
            .resolver(|_ctx| Ok(vec![Val::Int(42)]))
    }

    #[test]
    fn select_question_dialect_appends_predicate() {
        let mut registry = ScopeRegistry::new();
        registry.register(orders_rule());
        let hook = ScopeHook::new(registry, HookConfig::default());

        let (_, sql, args) = hook
            .before(
                CallContext::new(),
                "SELECT id FROM orders WHERE paid = ?",
                &[Val::Bool(true)],
            )
            .unwrap();

        assert_eq!(sql, "SELECT id FROM orders WHERE paid = ? AND (orders.tenant_id = ?)");
        assert_eq!(args, vec![Val::Bool(true), Val::Int(42)]);
    }

    #[test]
    fn select_dollar_dialect_with_order_by_inserts_where() {
        let mut registry = ScopeRegistry::new();
        registry.register(orders_rule());
        let hook = ScopeHook::new(registry, HookConfig::default());

        let (_, sql, args) = hook
            .before(
                CallContext::new().with_driver_hint("postgres"),
                "SELECT id FROM orders ORDER BY id LIMIT 10",
                &[],
            )
            .unwrap();

        assert_eq!(sql, "SELECT id FROM orders WHERE (orders.tenant_id = $1) ORDER BY id LIMIT 10");
        assert_eq!(args, vec![Val::Int(42)]);
    }

    #[test]
    fn nested_subquery_is_scoped_not_the_outer_unruled_table() {
        let mut registry = ScopeRegistry::new();
        registry.register(orders_rule());
        let hook = ScopeHook::new(registry, HookConfig::default());

        let (_, sql, args) = hook
            .before(
                CallContext::new().with_driver_hint("postgres"),
                "SELECT * FROM a WHERE x IN (SELECT id FROM orders)",
                &[],
            )
            .unwrap();

        assert_eq!(
            sql,
            "SELECT * FROM a WHERE x IN (SELECT id FROM orders WHERE (orders.tenant_id = $1))"
        );
        assert_eq!(args, vec![Val::Int(42)]);
    }

    #[test]
    fn cte_body_and_main_body_subquery_are_each_scoped_exactly_once() {
        let mut registry = ScopeRegistry::new();
        registry.register(orders_rule());
        let hook = ScopeHook::new(registry, HookConfig::default());

        let (_, sql, args) = hook
            .before(
                CallContext::new().with_driver_hint("postgres"),
                "WITH recent AS (SELECT id FROM orders) \
                 SELECT * FROM a WHERE x IN (SELECT id FROM orders) AND y IN (SELECT id FROM recent)",
                &[],
            )
            .unwrap();

        assert_eq!(
            sql,
            "WITH recent AS (SELECT id FROM orders WHERE (orders.tenant_id = $1)) \
             SELECT * FROM a WHERE x IN (SELECT id FROM orders WHERE (orders.tenant_id = $2)) \
             AND y IN (SELECT id FROM recent)"
        );
        assert_eq!(args, vec![Val::Int(42), Val::Int(42)]);
    }

    #[test]
    fn trusted_bypass_with_token_skips_rewrite() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let config = HookConfig::default().config(|c| {
            c.allow_trusted_bypass = true;
            c.require_bypass_token = true;
        });
        let hook = ScopeHook::new(registry, config);
        let ctx = CallContext::new().with_bypass(TrustedBypass::new(true, "ops-task-42"));

        let (_, sql, args) = hook
            .before(ctx, "SELECT * FROM orders /* scope:bypass */", &[])
            .unwrap();

        assert_eq!(sql, "SELECT * FROM orders /* scope:bypass */");
        assert!(args.is_empty());
    }

    #[test]
    fn bypass_token_without_trusted_context_is_rejected() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let hook = ScopeHook::new(registry, HookConfig::default());

        let err = hook
            .before(CallContext::new(), "SELECT * FROM orders /* scope:bypass */", &[])
            .unwrap_err();

        assert_eq!(err.code, DenyCode::BypassNotAllowed);
    }

    #[test]
    fn trusted_bypass_without_reason_is_rejected() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let config = HookConfig::default().config(|c| c.allow_trusted_bypass = true);
        let hook = ScopeHook::new(registry, config);
        let ctx = CallContext::new().with_bypass(TrustedBypass::new(true, ""));

        let err = hook.before(ctx, "SELECT * FROM orders", &[]).unwrap_err();
        assert_eq!(err.code, DenyCode::BypassMissingReason);
    }

    #[test]
    fn unsupported_statement_passes_through_by_default() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let hook = ScopeHook::new(registry, HookConfig::default());

        let (_, sql, _) = hook
            .before(CallContext::new(), "CREATE TABLE t (id int)", &[])
            .unwrap();
        assert_eq!(sql, "CREATE TABLE t (id int)");
    }

    #[test]
    fn unsupported_statement_rejected_when_configured() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let config = HookConfig::default().config(|c| c.reject_unknown_shapes = true);
        let hook = ScopeHook::new(registry, config);

        let err = hook
            .before(CallContext::new(), "CREATE TABLE t (id int)", &[])
            .unwrap_err();
        assert_eq!(err.code, DenyCode::UnsupportedStatement);
    }

    #[test]
    fn delete_without_from_collects_no_refs() {
        let mut registry = ScopeRegistry::new();
        registry.register(orders_rule());
        let hook = ScopeHook::new(registry, HookConfig::default());

        let (_, sql, _) = hook
            .before(CallContext::new(), "DELETE WHERE 1 = 1", &[])
            .unwrap();
        assert_eq!(sql, "DELETE WHERE 1 = 1");
    }

    #[test]
    fn semicolon_inside_string_literal_does_not_split_statements() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let hook = ScopeHook::new(registry, HookConfig::default());

        let (_, sql, _) = hook
            .before(CallContext::new(), "SELECT ';' FROM t", &[])
            .unwrap();
        assert_eq!(sql, "SELECT ';' FROM t");
    }

    #[test]
    fn missing_rule_rejected_in_strict_all_tables_mode() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let config = HookConfig::default().config(|c| c.strict_all_tables = true);
        let hook = ScopeHook::new(registry, config);

        let err = hook
            .before(CallContext::new(), "SELECT * FROM orders", &[])
            .unwrap_err();
        assert_eq!(err.code, DenyCode::MissingRule);
    }

    #[test]
    fn strict_mode_rejects_unscoped_statement() {
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let config = HookConfig::default().config(|c| c.strict_mode = true);
        let hook = ScopeHook::new(registry, config);

        let err = hook
            .before(CallContext::new(), "SELECT * FROM untracked", &[])
            .unwrap_err();
        assert_eq!(err.code, DenyCode::UnscopedStatement);
    }

    #[test]
    fn audit_decision_carries_statement_type_on_every_outcome() {
        let decisions = std::sync::Arc::new(std::sync::Mutex::new(Vec::<AuditDecision>::new()));

        let sink = decisions.clone();
        let mut registry = ScopeRegistry::new();
        registry.register(orders_rule());
        let hook = ScopeHook::new(registry, HookConfig::default())
            .with_audit_sink(move |_ctx, decision| sink.lock().unwrap().push(decision.clone()));
        hook.before(CallContext::new(), "SELECT id FROM orders WHERE paid = ?", &[Val::Bool(true)])
            .unwrap();

        let sink = decisions.clone();
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let config = HookConfig::default().config(|c| c.strict_all_tables = true);
        let hook = ScopeHook::new(registry, config)
            .with_audit_sink(move |_ctx, decision| sink.lock().unwrap().push(decision.clone()));
        hook.before(CallContext::new(), "UPDATE orders SET paid = 1", &[]).unwrap_err();

        let sink = decisions.clone();
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let hook = ScopeHook::new(registry, HookConfig::default())
            .with_audit_sink(move |_ctx, decision| sink.lock().unwrap().push(decision.clone()));
        hook.before(CallContext::new(), "DELETE FROM orders", &[]).unwrap();

        let sink = decisions.clone();
        let registry: ScopeRegistry<Val> = ScopeRegistry::new();
        let hook = ScopeHook::new(registry, HookConfig::default())
            .with_audit_sink(move |_ctx, decision| sink.lock().unwrap().push(decision.clone()));
        hook.before(CallContext::new(), "SELECT * FROM orders /* scope:bypass */", &[])
            .unwrap_err();

        let recorded = decisions.lock().unwrap();
        assert_eq!(recorded.len(), 4);
        assert_eq!(recorded[0].statement_type.as_deref(), Some("SELECT"));
        assert_eq!(recorded[1].statement_type.as_deref(), Some("UPDATE"));
        assert_eq!(recorded[2].statement_type.as_deref(), Some("DELETE"));
        assert_eq!(recorded[3].statement_type.as_deref(), Some("SELECT"));
    }
}
