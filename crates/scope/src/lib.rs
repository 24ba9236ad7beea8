//! Resource-scope SQL rewriter: a `Before`-hook that injects tenancy and
//! ownership predicates into `SELECT`/`UPDATE`/`DELETE` (including `WITH`
//! prefixes and nested subqueries) before a query reaches the driver, plus
//! its audit bus and placeholder bookkeeping.

mod audit;
mod config;
mod context;
mod engine;
mod error;
mod hook;
mod placeholder;
mod rule;
mod tableref;

pub use audit::{Action, AuditDecision, AuditSink};
pub use config::HookConfig;
pub use context::{CallContext, TrustedBypass};
pub use error::{DenyCode, ScopeError};
pub use hook::ScopeHook;
pub use placeholder::detect;
pub use rule::{CompiledScopeRule, Resolver, ScopeRegistry, ScopeRule};
pub use tableref::TableRef;
