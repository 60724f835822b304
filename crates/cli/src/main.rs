// ABOUTME: CLI for running the curator engine over JSON files.
// ABOUTME: Normalizes a raw batch, optionally enriches it from a detail table, filters and prints JSON.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use curator_engine::{Engine, EngineConfig, FilterCriteria, MissingIdPolicy, RawRecord};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Filter a batch of content records and output JSON.
#[derive(Parser, Debug)]
#[command(name = "curator")]
#[command(about = "Normalize and filter content records with the curator engine", long_about = None)]
struct Args {
    /// JSON array of raw records. Use "-" to read from stdin.
    records: String,

    /// JSON criteria document (tags, subscription, age, resolutions, special_mode, special_payload).
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// JSON object mapping id -> detail record (null = no detail). Enables enrichment.
    #[arg(long)]
    details: Option<PathBuf>,

    /// JSON engine config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Derive ids for records without one instead of generating random ones.
    #[arg(long, default_value_t = false)]
    derive_ids: bool,

    /// Print normalized records without filtering.
    #[arg(long, default_value_t = false)]
    normalize_only: bool,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let engine = Engine::new(load_config(&args)?)?;
    let records = RawRecord::batch_from_value(read_json(&args.records)?)
        .context("records must be a JSON array of objects")?;

    let output = if args.normalize_only {
        serde_json::to_value(engine.normalize_batch(&records))?
    } else {
        let criteria: FilterCriteria = match &args.criteria {
            Some(path) => serde_json::from_value(read_json_path(path)?)
                .with_context(|| format!("invalid criteria in {}", path.display()))?,
            None => FilterCriteria::default(),
        };

        let outcome = match &args.details {
            Some(path) => {
                let table = load_details(path)?;
                engine
                    .filter_with_enrichment(&records, &criteria, |id| {
                        let found = lookup_detail(&table, &id);
                        async move { found }
                    })
                    .await?
            }
            None => engine.filter_now(&records, &criteria)?,
        };
        serde_json::to_value(outcome)?
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EngineConfig::from_json(&text)?
        }
        None => EngineConfig::default(),
    };
    // a namespace from the config file takes precedence
    if args.derive_ids && config.missing_id == MissingIdPolicy::Random {
        config.missing_id = MissingIdPolicy::Derived {
            namespace: Uuid::NAMESPACE_OID,
        };
    }
    Ok(config)
}

/// Stands in for the upstream detail endpoint: a missing entry is a fetch failure.
fn lookup_detail(table: &HashMap<String, Value>, id: &str) -> Result<Option<RawRecord>> {
    match table.get(id) {
        None => Err(anyhow!("no detail entry for {}", id)),
        Some(Value::Null) => Ok(None),
        Some(value) => {
            debug!(id, "detail served from table");
            Ok(Some(RawRecord::from_value(value.clone())?))
        }
    }
}

fn load_details(path: &Path) -> Result<HashMap<String, Value>> {
    match read_json_path(path)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(anyhow!(
            "details file {} must be a JSON object keyed by id",
            path.display()
        )),
    }
}

fn read_json(target: &str) -> Result<Value> {
    if target == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(serde_json::from_str(&buf)?);
    }
    read_json_path(Path::new(target))
}

fn read_json_path(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(anyhow!("file not found: {}", path.display()));
    }
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}
