use scopeql_helpers::{canonical_identifier, Config, IndexMap};

use crate::context::CallContext;
use crate::error::ScopeError;

/// Resolves a compiled rule's parameter values for one call. Boxed rather
/// than generic over a closure type so a [`ScopeRegistry`] can hold rules
/// with different resolvers behind one type.
pub type Resolver<V> = Box<dyn Fn(&CallContext) -> Result<Vec<V>, ScopeError> + Send + Sync>;

/// Builder for a per-table scope rule: spec §3 "Scope Rule". `table_raw`
/// keeps the caller's original spelling (schema-qualified, original case)
/// for error messages; lookups key off its canonical form.
pub struct ScopeRule<V> {
    table_raw: String,
    column: Option<String>,
    predicate_template: Option<String>,
    resolver: Option<Resolver<V>>,
}

impl<V> ScopeRule<V> {
    pub fn new(table_raw: impl Into<String>) -> Self {
        Self {
            table_raw: table_raw.into(),
            column: None,
            predicate_template: None,
            resolver: None,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Sets an explicit predicate template. May contain `{{alias}}` (
    /// substituted once with the matched ref's alias) and any number of
    /// `{{param}}` tokens (each substituted with the next placeholder from
    /// the active dialect builder; their count is the rule's arity).
    pub fn predicate(mut self, template: impl Into<String>) -> Self {
        self.predicate_template = Some(template.into());
        self
    }

    pub fn resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&CallContext) -> Result<Vec<V>, ScopeError> + Send + Sync + 'static,
    {
        self.resolver = Some(Box::new(f));
        self
    }

    fn compile(self) -> Option<CompiledScopeRule<V>> {
        if self.predicate_template.is_none() && self.column.is_none() {
            log::warn!(
                "scope rule for table {:?} has neither a column nor a predicate template; dropping",
                self.table_raw
            );
            return None;
        }
        let canonical = canonical_identifier(&self.table_raw);
        let (param_count, has_alias_token, has_param_tokens) = match &self.predicate_template {
            Some(template) => (
                template.matches("{{param}}").count(),
                template.contains("{{alias}}"),
                template.contains("{{param}}"),
            ),
            None => (1, true, true),
        };
        Some(CompiledScopeRule {
            table_raw: self.table_raw,
            canonical,
            column: self.column,
            predicate_template: self.predicate_template,
            resolver: self.resolver,
            param_count,
            has_alias_token,
            has_param_tokens,
        })
    }
}

/// A [`ScopeRule`] after validation, keyed by canonical table name.
pub struct CompiledScopeRule<V> {
    pub table_raw: String,
    pub canonical: String,
    pub column: Option<String>,
    pub predicate_template: Option<String>,
    pub resolver: Option<Resolver<V>>,
    pub param_count: usize,
    pub has_alias_token: bool,
    pub has_param_tokens: bool,
}

impl<V> CompiledScopeRule<V> {
    /// The predicate source text, synthesizing `alias.column = {{param}}`
    /// when no explicit template was supplied.
    pub fn template(&self) -> String {
        match &self.predicate_template {
            Some(t) => t.clone(),
            None => format!(
                "{{{{alias}}}}.{} = {{{{param}}}}",
                self.column.as_deref().unwrap_or("id")
            ),
        }
    }
}

/// Mapping from canonical table name to compiled rule. Lookup is
/// last-write-wins; registration order otherwise has no effect on
/// behavior.
#[derive(Default)]
pub struct ScopeRegistry<V> {
    rules: IndexMap<String, CompiledScopeRule<V>>,
}

impl<V> ScopeRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and registers `rule`. Returns `false` (and drops the rule,
    /// logging a warning) when it is ill-formed.
    pub fn register(&mut self, rule: ScopeRule<V>) -> bool {
        match rule.compile() {
            Some(compiled) => {
                self.rules.insert(compiled.canonical.clone(), compiled);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, canonical_table: &str) -> Option<&CompiledScopeRule<V>> {
        self.rules.get(canonical_table)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
