//! Operator CLI for field canonicalization and record resolution.
//!
//! Usage:
//!     gardenkeep fields --kind plant
//!     gardenkeep normalize --kind plant payload.json
//!     gardenkeep resolve --kind plant --records plants.json "Roses"
//!     gardenkeep health --url http://127.0.0.1:8080/plants

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gardenkeep_explain::{decide, explain_result, method_label, summarize, AmbiguityPolicy};
use gardenkeep_model::{EntityKind, FieldRef, Record};
use gardenkeep_request::{NormalizeMode, NormalizedRequest};
use gardenkeep_resolve::{resolve, ResolverConfig};
use gardenkeep_schema::{AliasTable, FieldRegistry};
use gardenkeep_store::{HttpStore, HttpStoreConfig, MemoryStore, RecordStore, SnapshotCache};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gardenkeep")]
#[command(about = "Canonicalize record payloads and resolve records by ID or name")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the canonical fields of an entity kind
    Fields {
        /// Entity kind (plant, log)
        #[arg(short, long, default_value = "plant")]
        kind: EntityKind,
    },

    /// Normalize a JSON payload's keys
    Normalize {
        /// Payload file, or - for stdin
        payload: PathBuf,

        /// Entity kind (plant, log)
        #[arg(short, long, default_value = "plant")]
        kind: EntityKind,

        /// Pass unrecognized keys through instead of rejecting them
        #[arg(long)]
        lenient: bool,
    },

    /// Resolve an ID or name against a record snapshot
    Resolve {
        /// Numeric ID or (partial) name
        identifier: String,

        /// Entity kind (plant, log)
        #[arg(short, long, default_value = "plant")]
        kind: EntityKind,

        /// JSON file with the records
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        records: Option<PathBuf>,

        /// Base URL of the sheet service
        #[arg(long)]
        url: Option<String>,

        /// Resolver config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail when two candidates tie for the best score
        #[arg(long)]
        reject_ties: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Snapshot cache TTL in seconds
        #[arg(long, default_value_t = 30)]
        cache_ttl: u64,
    },

    /// Check the sheet service
    Health {
        /// Base URL of the sheet service
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("gardenkeep={level}").parse()?),
        )
        .init();

    // An inconsistent schema is fatal before any command runs.
    let registry = FieldRegistry::builtin().context("invalid built-in schema")?;

    match cli.command {
        Commands::Fields { kind } => run_fields(registry.table(kind)),
        Commands::Normalize {
            payload,
            kind,
            lenient,
        } => run_normalize(registry.table(kind), &payload, lenient),
        Commands::Resolve {
            identifier,
            kind,
            records,
            url,
            config,
            reject_ties,
            format,
            cache_ttl,
        } => {
            let config = match config {
                Some(path) => ResolverConfig::from_json_str(&read_input(&path)?)?,
                None => ResolverConfig::default(),
            };
            let policy = if reject_ties {
                AmbiguityPolicy::RejectTies
            } else {
                AmbiguityPolicy::BestEffort
            };
            let table = registry.table(kind).clone();
            let ttl = Duration::from_secs(cache_ttl);
            let snapshot = match (records, url) {
                (Some(path), _) => {
                    let json: Value = serde_json::from_str(&read_input(&path)?)
                        .with_context(|| format!("parsing {}", path.display()))?;
                    load_snapshot(MemoryStore::from_json(json, &table)?, ttl).await?
                }
                (None, Some(url)) => {
                    let store = HttpStore::new(
                        HttpStoreConfig {
                            base_url: url,
                            ..Default::default()
                        },
                        table,
                    )?;
                    load_snapshot(store, ttl).await?
                }
                (None, None) => anyhow::bail!("either --records or --url is required"),
            };
            run_resolve(&identifier, kind, &snapshot, &config, policy, format)
        }
        Commands::Health { url } => run_health(url).await,
    }
}

fn run_fields(table: &AliasTable) -> Result<()> {
    println!("{} fields ({} spellings)", table.kind(), table.len());
    println!("---");
    for def in table.fields() {
        println!("{:<26} {:<15} {}", def.name(), def.category().as_str(), def.aliases.join(", "));
    }
    Ok(())
}

fn run_normalize(table: &AliasTable, payload: &Path, lenient: bool) -> Result<()> {
    let json: Value = serde_json::from_str(&read_input(payload)?)
        .with_context(|| format!("parsing {}", payload.display()))?;
    let mode = if lenient {
        NormalizeMode::Lenient
    } else {
        NormalizeMode::Strict
    };

    let request = NormalizedRequest::from_json(table, json, mode)?;
    println!("{}", serde_json::to_string_pretty(&request)?);

    if let Err(e) = request.ensure_recognized() {
        eprintln!("HTTP {}: {}", e.status_code(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn load_snapshot<S: RecordStore + Sync>(store: S, ttl: Duration) -> Result<Vec<Record>> {
    let cache = SnapshotCache::new(store, ttl);
    let snapshot = cache.snapshot().await?;
    tracing::info!(store = cache.store().name(), records = snapshot.len(), "Loaded snapshot");
    Ok(snapshot.as_ref().clone())
}

fn run_resolve(
    identifier: &str,
    kind: EntityKind,
    snapshot: &[Record],
    config: &ResolverConfig,
    policy: AmbiguityPolicy,
    format: OutputFormat,
) -> Result<()> {
    let result = resolve(identifier, snapshot, &FieldRef::for_kind(kind), config)?;
    let outcome = decide(identifier, &result, policy);

    match format {
        OutputFormat::Json => {
            let body = json!({
                "result": result,
                "explanation": explain_result(&result, identifier),
                "error": outcome.as_ref().err().map(|e| e.to_payload()),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            println!("Resolving '{}' against {} {} record(s)", identifier, snapshot.len(), kind);
            println!("---");
            println!("{}", summarize(&result));
            println!("{}", explain_result(&result, identifier).detail);
            for (i, alt) in result.alternatives.iter().enumerate() {
                println!(
                    "  {}. {} (row {}) {:.2} via {}",
                    i + 1,
                    alt.record_ref.name,
                    alt.record_ref.row,
                    alt.score,
                    method_label(alt.method)
                );
            }
        }
    }

    if let Err(e) = outcome {
        eprintln!("HTTP {}: {}", e.status_code(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_health(url: String) -> Result<()> {
    let registry_table = AliasTable::for_kind(EntityKind::Plant)?;
    let store = HttpStore::new(
        HttpStoreConfig {
            base_url: url,
            ..Default::default()
        },
        registry_table,
    )?;

    print!("Checking {} store... ", store.name());

    match store.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
