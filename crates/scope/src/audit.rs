use crate::context::CallContext;
use crate::error::DenyCode;

/// The outcome of a single rewrite attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Scoped,
    Rejected,
    Bypassed,
    Passthrough,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Scoped => "scoped",
            Action::Rejected => "rejected",
            Action::Bypassed => "bypassed",
            Action::Passthrough => "passthrough",
        }
    }
}

/// A structured record describing what the rewriter did with one query.
/// Exactly one is emitted per `Before` invocation, even on early rejection.
/// Fields are filled in incrementally as the rewrite progresses, so most
/// start empty and are populated only as far as the pipeline reached.
#[derive(Debug, Clone, Default)]
pub struct AuditDecision {
    pub action: Option<Action>,
    pub reason_code: Option<DenyCode>,
    pub reason: Option<String>,
    pub statement_type: Option<String>,
    pub matched_tables: Vec<String>,
    pub applied_rules: Vec<String>,
    pub added_predicate_count: u32,
    pub final_query: String,
}

impl AuditDecision {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A callback invoked once per `Before` with the final decision. Must never
/// panic; a sink doing I/O is responsible for its own concurrency safety,
/// the hook imposes no lock.
pub type AuditSink = Box<dyn Fn(&CallContext, &AuditDecision) + Send + Sync>;
