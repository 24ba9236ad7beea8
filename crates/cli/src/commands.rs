use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "scopeql")]
#[command(about = "Compile named-parameter SQL and apply resource-scope rewriting", long_about = None, version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(name = "compile", about = "Compile :name placeholders into a driver dialect's wire form")]
    Compile(CompileArgs),
    #[command(name = "scope", about = "Apply a single resource-scope rule and print the rewritten query")]
    Scope(ScopeArgs),
}

#[derive(Debug, Parser)]
pub struct CompileArgs {
    /// The SQL text, containing `:name` placeholders.
    pub sql: String,
    /// Driver name hint (e.g. postgres, mysql, mssql); unrecognized names fall back to `?`.
    #[arg(long, default_value = "postgres")]
    pub driver: String,
}

#[derive(Debug, Parser)]
pub struct ScopeArgs {
    /// The SQL text to rewrite.
    pub sql: String,
    /// Table the rule applies to.
    #[arg(long)]
    pub table: String,
    /// Column the rule compares against the resolved value.
    #[arg(long)]
    pub column: String,
    /// Literal value the resolver always returns (demo only; a real
    /// resolver would read it from the ambient call context).
    #[arg(long)]
    pub value: String,
    /// Driver name hint, as in `compile`.
    #[arg(long, default_value = "postgres")]
    pub driver: String,
}
