#![deny(warnings)]

//! Headless CLI: price a JSON quote request and print the JSON result.

use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use quote_engine::{
    AppliedOption, Catalog, EngineError, PricingPolicy, QuoteEngine, QuoteRequest,
    SuggestionOptions,
};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: pouch-quote --request <file.json> [--option column:N|sku:N] \
[--economic] [--compare Q1,Q2,...] [--policy <file.yaml>] [--catalog <file.yaml>]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    request: Option<String>,
    option: Option<String>,
    economic: bool,
    compare: Option<String>,
    policy: Option<String>,
    catalog: Option<String>,
    version: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--request" => out.request = it.next(),
            "--option" => out.option = it.next(),
            "--economic" => out.economic = true,
            "--compare" => out.compare = it.next(),
            "--policy" => out.policy = it.next(),
            "--catalog" => out.catalog = it.next(),
            "--version" | "-V" => out.version = true,
            _ => {}
        }
    }
    out
}

/// Parse `column:N` or `sku:N`.
fn parse_option(s: &str) -> Result<AppliedOption> {
    let (kind, n) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("option must look like column:N or sku:N, got {s:?}"))?;
    match kind {
        "column" => Ok(AppliedOption::Column {
            column_count: n.parse().with_context(|| format!("bad column count {n:?}"))?,
        }),
        "sku" => Ok(AppliedOption::SkuSplit {
            sku_count: n.parse().with_context(|| format!("bad SKU count {n:?}"))?,
        }),
        other => bail!("unknown option kind {other:?}"),
    }
}

/// Parse a comma-separated quantity list such as `1000,5000,10000`.
fn parse_quantities(s: &str) -> Result<Vec<u64>> {
    s.split(',')
        .map(|q| {
            q.trim()
                .parse()
                .with_context(|| format!("bad quantity {q:?}"))
        })
        .collect()
}

fn load_policy(path: Option<&str>) -> Result<PricingPolicy> {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p).with_context(|| format!("reading policy {p}"))?;
            PricingPolicy::from_yaml_str(&text).with_context(|| format!("loading policy {p}"))
        }
        None => Ok(PricingPolicy::standard().clone()),
    }
}

fn load_catalog(path: Option<&str>) -> Result<Catalog> {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p).with_context(|| format!("reading catalog {p}"))?;
            Catalog::from_yaml_str(&text).with_context(|| format!("loading catalog {p}"))
        }
        None => Ok(Catalog::standard().clone()),
    }
}

fn classify(e: EngineError) -> anyhow::Error {
    anyhow!("{}: {}", e.kind(), e)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1));
    if args.version {
        println!(
            "pouch-quote {} ({})",
            env!("CARGO_PKG_VERSION"),
            env!("POUCH_QUOTE_GIT_SHA")
        );
        return Ok(());
    }
    let request_path = args.request.as_deref().ok_or_else(|| anyhow!(USAGE))?;
    let applied = args.option.as_deref().map(parse_option).transpose()?;
    let compare = args.compare.as_deref().map(parse_quantities).transpose()?;
    info!(request = request_path, ?applied, economic = args.economic, ?compare, "starting CLI");

    let policy = load_policy(args.policy.as_deref())?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    let engine = QuoteEngine::new(&catalog, &policy);

    let text = fs::read_to_string(request_path)
        .with_context(|| format!("reading request {request_path}"))?;
    let request: QuoteRequest =
        serde_json::from_str(&text).with_context(|| format!("parsing request {request_path}"))?;

    let quote = engine
        .calculate_quote_with_option(&request, applied)
        .map_err(classify)?;
    let output = if args.economic || compare.is_some() {
        let mut out = serde_json::Map::new();
        out.insert("quote".into(), serde_json::to_value(&quote)?);
        if args.economic {
            let suggestion = engine
                .economic_suggestion(
                    &request,
                    &SuggestionOptions {
                        include_column_options: true,
                        ..SuggestionOptions::default()
                    },
                )
                .map_err(classify)?;
            out.insert("economic".into(), serde_json::to_value(&suggestion)?);
        }
        if let Some(quantities) = &compare {
            let comparison = engine
                .compare_quantities(&request, quantities)
                .map_err(classify)?;
            out.insert("comparison".into(), serde_json::to_value(&comparison)?);
        }
        serde_json::Value::Object(out)
    } else {
        serde_json::to_value(&quote)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
