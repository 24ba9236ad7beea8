use thiserror::Error;

/// Stable deny-code strings surfaced on a rejected rewrite, per spec §6.
/// `Display` yields the exact wire string so audit sinks and callers can
/// match on it without a separate mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyCode {
    MissingContext,
    UnknownShape,
    MissingRule,
    ResolverRequired,
    ResolverFailed,
    ParamMismatch,
    UnscopedStatement,
    UnsupportedStatement,
    BypassNotAllowed,
    BypassMissingReason,
    BypassTokenRequired,
}

impl DenyCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyCode::MissingContext => "missing_context",
            DenyCode::UnknownShape => "unknown_shape",
            DenyCode::MissingRule => "missing_rule",
            DenyCode::ResolverRequired => "resolver_required",
            DenyCode::ResolverFailed => "resolver_failed",
            DenyCode::ParamMismatch => "param_mismatch",
            DenyCode::UnscopedStatement => "unscoped_statement",
            DenyCode::UnsupportedStatement => "unsupported_statement",
            DenyCode::BypassNotAllowed => "bypass_not_allowed",
            DenyCode::BypassMissingReason => "bypass_missing_reason",
            DenyCode::BypassTokenRequired => "bypass_token_required",
        }
    }
}

impl std::fmt::Display for DenyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected or failed rewrite. Carries the stable [`DenyCode`] plus a
/// human-readable message; distinguished by type from driver errors so
/// callers can branch on the code without string matching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ScopeError {
    pub code: DenyCode,
    pub message: String,
}

impl ScopeError {
    pub fn new(code: DenyCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
