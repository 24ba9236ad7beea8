use scopeql_helpers::Config;

/// Immutable-after-construction policy for the resource-scope hook, spec
/// §3 "Hook Configuration".
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// When no predicate was produced for an otherwise-scopeable statement,
    /// reject with `unscoped_statement` instead of letting it through bare.
    pub strict_mode: bool,
    /// Reject with `missing_rule` when a table reference has no compiled
    /// rule, instead of silently skipping it.
    pub strict_all_tables: bool,
    /// Reject with `unknown_shape` when table-ref discovery cannot confirm
    /// its heuristics (rather than best-effort skip), and with
    /// `unsupported_statement` for statement types outside
    /// SELECT/UPDATE/DELETE/WITH.
    pub reject_unknown_shapes: bool,
    /// Whether a trusted-bypass call context is honored at all.
    pub allow_trusted_bypass: bool,
    /// Whether a trusted bypass additionally requires `bypass_token` to
    /// appear (case-insensitively) in the query text.
    pub require_bypass_token: bool,
    /// Case-insensitive marker recognized as a bypass request.
    pub bypass_token: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            strict_all_tables: false,
            reject_unknown_shapes: false,
            allow_trusted_bypass: false,
            require_bypass_token: true,
            bypass_token: "/* scope:bypass */".to_string(),
        }
    }
}

impl HookConfig {
    pub fn contains_bypass_token(&self, sql: &str) -> bool {
        sql.to_ascii_lowercase()
            .contains(&self.bypass_token.to_ascii_lowercase())
    }
}
