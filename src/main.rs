use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use compute_context::{Context, ContextError, Ownership, Result, Scope, Substitutions};
use itertools::Itertools;
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Expand `$name`, `#` and `~` markers in strings against a context built on the command line.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Strings to substitute.
    strings: Vec<String>,
    /// Frame number (defaults to 1).
    #[arg(long)]
    frame: Option<f64>,
    /// Context entry; VALUE is parsed as JSON when possible, else kept as a string.
    #[arg(long = "context", num_args = 2, value_names = ["NAME", "VALUE"])]
    context: Vec<String>,
    /// JSON object of context entries, applied before any --context.
    #[arg(long)]
    context_file: Option<PathBuf>,
    /// How the scoped context holds the values it was built from.
    #[arg(long, default_value = "shared")]
    ownership: Ownership,
    /// Copy `$name` markers through unchanged.
    #[arg(long)]
    no_variables: bool,
    /// Copy `#` markers through unchanged.
    #[arg(long)]
    no_frame: bool,
    /// Copy a leading `~` through unchanged.
    #[arg(long)]
    no_tilde: bool,
    /// Also print the context hash.
    #[arg(long)]
    hash: bool,
    /// Print a JSON report instead of plain lines.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn substitutions(&self) -> Substitutions {
        let mut subs = Substitutions::all();
        if self.no_variables {
            subs = subs.without_variables();
        }
        if self.no_frame {
            subs = subs.without_frame();
        }
        if self.no_tilde {
            subs = subs.without_tilde();
        }
        subs
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let base = build_context(args)?;
    let working = Arc::new(base.copy(args.ownership));
    debug!(context = ?working, "built context");

    let _scope = Scope::new(&working);
    let current = Context::current();
    let subs = args.substitutions();
    let outputs: Vec<String> = args
        .strings
        .iter()
        .map(|s| current.substitute_with(s, subs))
        .collect::<Result<_>>()?;

    if args.json {
        let report = json!({
            "context": &*current,
            "hash": current.hash().to_hex(),
            "results": args
                .strings
                .iter()
                .zip(&outputs)
                .map(|(input, output)| json!({ "input": input, "output": output }))
                .collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| ContextError::InvalidArgument(format!("cannot encode report: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    for output in &outputs {
        println!("{output}");
    }
    if args.hash {
        println!("hash: {}", current.hash());
    }
    Ok(())
}

fn build_context(args: &Args) -> Result<Context> {
    let mut context = match &args.context_file {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                ContextError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
            })?;
            let value: Value = serde_json::from_str(&text).map_err(|e| {
                ContextError::InvalidArgument(format!("{} is not valid JSON: {e}", path.display()))
            })?;
            Context::from_json_object(&value)?
        }
        None => Context::new(),
    };
    for (name, raw) in args.context.iter().tuples() {
        context.set(name, parse_value(raw));
    }
    if let Some(frame) = args.frame {
        context.set_frame(frame)?;
    }
    Ok(context)
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
