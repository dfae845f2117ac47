//! Reads a JSON document and one or more filter expressions and prints the
//! filtered result. Mirrors the tracing-subscriber init pattern the main
//! service uses, scaled down to a single-binary demo.

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use squiggly_filter::{Engine, JsonValueNode};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "squiggly-filter", about = "Apply a property filter to a JSON document")]
struct Args {
    /// Filter expression(s), e.g. "id,name@upper,reporter[-email]". Repeat
    /// for multiple filters, combined by union.
    #[arg(short, long = "filter", required = true)]
    filters: Vec<String>,

    /// JSON document to filter. Reads stdin if omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Pretty-print the output.
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> Result<(), String> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let args = Args::parse();

    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map_err(|e| format!("reading stdin: {e}"))?;
            buf
        }
    };

    let document: serde_json::Value = serde_json::from_str(&raw).map_err(|e| format!("invalid JSON: {e}"))?;
    let engine: Engine<JsonValueNode> = Engine::new();

    let filters: Vec<&str> = args.filters.iter().map(String::as_str).collect();
    let result = engine
        .apply(&JsonValueNode::from(document), &filters)
        .map_err(|e| format!("applying filter: {e}"))?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&result.0)
    } else {
        serde_json::to_string(&result.0)
    }
    .map_err(|e| format!("serializing result: {e}"))?;

    println!("{output}");
    Ok(())
}
