mod commands;
mod logger;

use clap::Parser;

use commands::{Cli, Commands, CompileArgs, ScopeArgs};
use scopeql_cli_lib::{DriverHint, Value};
use scopeql_compiler::compile;
use scopeql_scope::{CallContext, HookConfig, ScopeHook, ScopeRegistry, ScopeRule};

fn main() {
    let _ = logger::init();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Compile(args) => run_compile(args),
        Commands::Scope(args) => run_scope(args),
    };
    std::process::exit(code);
}

fn run_compile(args: CompileArgs) -> i32 {
    let dialect = DriverHint::new(&args.driver).dialect();
    match compile(&args.sql, dialect) {
        Ok((sql, names)) => {
            println!("{sql}");
            if !names.is_empty() {
                eprintln!("params: {}", names.join(", "));
            }
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn run_scope(args: ScopeArgs) -> i32 {
    let mut registry: ScopeRegistry<Value> = ScopeRegistry::new();
    let value = Value::Text(args.value.clone());
    registry.register(
        ScopeRule::new(args.table.clone())
            .column(args.column.clone())
            .resolver(move |_ctx| Ok(vec![value.clone()])),
    );
    let hook = ScopeHook::new(registry, HookConfig::default());
    let ctx = CallContext::new().with_driver_hint(&args.driver);

    match hook.before(ctx, &args.sql, &[]) {
        Ok((_, sql, values)) => {
            println!("{sql}");
            if !values.is_empty() {
                let rendered: Vec<String> = values.iter().map(Value::to_string).collect();
                eprintln!("args: [{}]", rendered.join(", "));
            }
            0
        }
        Err(err) => {
            eprintln!("rejected ({}): {}", err.code, err.message);
            1
        }
    }
}
