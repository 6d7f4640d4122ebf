//! Compile search parameters and print the backend query body.
//!
//! Usage: compile-query [--pretty] q=monsoon language=Hindi mood=calm mood=dreamy page=2

use anyhow::{bail, Result};
use clap::Parser;
use serde_json::json;

use tunefacet::progress::init_tracing;
use tunefacet::{compile, SearchParameters};

#[derive(Parser)]
#[command(name = "compile-query")]
#[command(about = "Print the search-backend request for a set of search parameters")]
struct Args {
    /// key=value search parameters; repeat a facet key to match any of several values
    params: Vec<String>,

    #[arg(long)]
    pretty: bool,
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("Expected key=value, got '{}'", raw),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let pairs = args
        .params
        .iter()
        .map(|p| split_pair(p))
        .collect::<Result<Vec<_>>>()?;
    let params = SearchParameters::from_pairs(pairs);
    let window = params.pagination();

    let request = json!({
        "from": window.from(),
        "size": window.size,
        "body": compile(&params),
    });

    let out = if args.pretty {
        serde_json::to_string_pretty(&request)?
    } else {
        serde_json::to_string(&request)?
    };
    println!("{}", out);
    Ok(())
}
