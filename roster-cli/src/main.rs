//! Roster CLI
//!
//! Command-line front end for a caching node registry: seeds an in-memory
//! authoritative registry, wraps it in the TTL cache and runs queries,
//! mutations or a concurrency probe against it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use roster_cache::CachingRegistry;
use roster_core::{CacheConfig, ManualClock, Node, NodeList, NodeRegistry, RegistryError};
use roster_registry::MemoryRegistry;

/// Roster - cached cluster node membership
#[derive(Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Comma-separated node ids to seed the registry with
    #[arg(short, long, global = true, value_delimiter = ',')]
    nodes: Vec<String>,

    /// JSON file with an array of node records to seed the registry with
    #[arg(long, global = true)]
    nodes_file: Option<PathBuf>,

    /// Snapshot time-to-live in seconds
    #[arg(long, global = true, env = "ROSTER_CACHE_TTL_SECS")]
    ttl: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered nodes
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a node is registered
    Contains {
        /// Node id
        id: String,
    },

    /// Register a node and show the refreshed listing
    Insert {
        /// Node id
        id: String,
    },

    /// Remove a node and show the refreshed listing
    Delete {
        /// Node id
        id: String,
    },

    /// Race concurrent readers against expiring snapshots and count delegate fetches
    Probe {
        /// Concurrent readers per round
        #[arg(short, long, default_value = "64")]
        readers: usize,
        /// Number of staleness windows to run
        #[arg(long, default_value = "5")]
        rounds: u64,
        /// Simulated delegate latency in milliseconds
        #[arg(long, default_value = "25")]
        latency_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "roster=debug,info"
    } else {
        "roster=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.ttl)?;
    let seed = load_seed(&cli.nodes, cli.nodes_file.as_deref())?;

    match cli.command {
        Commands::List { json } => cmd_list(seed, &config, json).await,
        Commands::Contains { id } => cmd_contains(seed, &config, &id).await,
        Commands::Insert { id } => cmd_insert(seed, &config, &id).await,
        Commands::Delete { id } => cmd_delete(seed, &config, &id).await,
        Commands::Probe {
            readers,
            rounds,
            latency_ms,
        } => cmd_probe(seed, &config, readers, rounds, latency_ms).await,
    }
}

/// Resolves the cache configuration: `--ttl` wins over the environment.
fn load_config(ttl: Option<u64>) -> Result<CacheConfig> {
    let mut config = CacheConfig::from_env().context("Invalid cache configuration")?;
    if let Some(ttl_seconds) = ttl {
        config.ttl_seconds = ttl_seconds;
    }
    config.validate().context("Invalid cache configuration")?;
    Ok(config)
}

/// Collects the seed nodes from `--nodes` and `--nodes-file`.
fn load_seed(ids: &[String], file: Option<&Path>) -> Result<Vec<Node>> {
    let mut nodes: Vec<Node> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(Node::new)
        .collect();

    if let Some(path) = file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read nodes file {}", path.display()))?;
        let from_file: Vec<Node> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse nodes file {}", path.display()))?;
        nodes.extend(from_file);
    }

    Ok(nodes)
}

/// Builds the authoritative registry and the cache in front of it.
async fn build(
    seed: Vec<Node>,
    config: &CacheConfig,
) -> Result<(Arc<MemoryRegistry>, CachingRegistry<Arc<MemoryRegistry>>)> {
    let delegate = Arc::new(MemoryRegistry::new());
    delegate.import(seed).context("Invalid seed node")?;

    let cache = CachingRegistry::new(delegate.clone(), config.ttl())
        .await
        .context("Failed to load initial snapshot")?;

    info!(nodes = delegate.len(), ttl_secs = config.ttl_seconds, "Registry ready");
    Ok((delegate, cache))
}

/// Prints a listing, one node per line.
fn print_nodes(nodes: &NodeList) {
    if nodes.is_empty() {
        println!("   {}", "(no nodes registered)".dimmed());
        return;
    }
    for node in nodes {
        if node.labels.is_empty() {
            println!("   {}", node.id.green());
        } else {
            let labels: Vec<String> = node.labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
            println!("   {} {}", node.id.green(), labels.join(",").dimmed());
        }
    }
}

/// Lists nodes, falling back to the stale snapshot if a refresh fails.
async fn cached_list(cache: &CachingRegistry<Arc<MemoryRegistry>>) -> Result<NodeList> {
    match cache.list().await {
        Ok(nodes) => Ok(nodes),
        Err(err @ RegistryError::RefreshFailed { .. }) => {
            println!("{} {}", "⚠️  Serving stale snapshot:".yellow(), err);
            err.into_stale_nodes()
                .context("Refresh failure without a snapshot")
        }
        Err(err) => Err(err).context("Failed to list nodes"),
    }
}

/// List nodes
async fn cmd_list(seed: Vec<Node>, config: &CacheConfig, json: bool) -> Result<()> {
    let (_, cache) = build(seed, config).await?;
    let nodes = cached_list(&cache).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        println!("{} {}", "📋 Registered nodes:".cyan().bold(), nodes.len());
        print_nodes(&nodes);
    }

    Ok(())
}

/// Membership query
async fn cmd_contains(seed: Vec<Node>, config: &CacheConfig, id: &str) -> Result<()> {
    let (_, cache) = build(seed, config).await?;

    let present = cache
        .contains(id)
        .await
        .with_context(|| format!("Failed to look up {id}"))?;

    if present {
        println!("{} {}", "✅ Registered:".green().bold(), id);
    } else {
        println!("{} {}", "❌ Not registered:".red().bold(), id);
    }

    Ok(())
}

/// Write-through insert
async fn cmd_insert(seed: Vec<Node>, config: &CacheConfig, id: &str) -> Result<()> {
    let (_, cache) = build(seed, config).await?;

    cache
        .insert(id)
        .await
        .with_context(|| format!("Failed to insert {id}"))?;

    println!("{} {}", "✅ Inserted:".green().bold(), id);
    print_nodes(&cached_list(&cache).await?);
    Ok(())
}

/// Write-through delete
async fn cmd_delete(seed: Vec<Node>, config: &CacheConfig, id: &str) -> Result<()> {
    let (_, cache) = build(seed, config).await?;

    cache
        .delete(id)
        .await
        .with_context(|| format!("Failed to delete {id}"))?;

    println!("{} {}", "✅ Deleted:".green().bold(), id);
    print_nodes(&cached_list(&cache).await?);
    Ok(())
}

/// Reads issued by a probe run, saturating instead of overflowing.
fn total_reads(readers: usize, rounds: u64) -> u64 {
    u64::try_from(readers)
        .unwrap_or(u64::MAX)
        .saturating_mul(rounds)
}

/// Concurrency probe
///
/// Drives a manual clock past the TTL once per round and releases all
/// readers at the same snapshot; the delegate should see one fetch per round.
async fn cmd_probe(
    seed: Vec<Node>,
    config: &CacheConfig,
    readers: usize,
    rounds: u64,
    latency_ms: u64,
) -> Result<()> {
    if readers == 0 {
        bail!("--readers must be at least 1");
    }

    println!(
        "{} {} readers x {} rounds",
        "🔬 Probing cache with".cyan().bold(),
        readers,
        rounds
    );

    let delegate = Arc::new(MemoryRegistry::new());
    delegate.import(seed).context("Invalid seed node")?;
    let clock = Arc::new(ManualClock::at_epoch());
    let cache = Arc::new(
        CachingRegistry::from_config(delegate.clone(), config, clock.clone())
            .await
            .context("Failed to load initial snapshot")?,
    );
    delegate.set_latency(Duration::from_millis(latency_ms));

    let pb = ProgressBar::new(rounds);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len} rounds")?
            .progress_chars("#>-"),
    );

    let start = std::time::Instant::now();
    for _ in 0..rounds {
        clock.advance(config.ttl() + Duration::from_secs(1));

        let mut tasks = JoinSet::new();
        for _ in 0..readers {
            let cache = cache.clone();
            tasks.spawn(async move { cache.list().await.map(|nodes| nodes.len()) });
        }
        while let Some(result) = tasks.join_next().await {
            result.context("Reader task panicked")??;
        }
        pb.inc(1);
    }
    pb.finish();
    let elapsed = start.elapsed();

    // One fetch happened at construction
    let fetches = delegate.stats().list_calls.saturating_sub(1);
    let reads = total_reads(readers, rounds);

    println!("\n{}", "📈 Results:".green().bold());
    println!("   Reads served:     {}", reads);
    println!("   Delegate fetches: {}", fetches);
    println!("   Elapsed:          {:?}", elapsed);

    if fetches == rounds {
        println!("   {} One fetch per staleness window", "✅".green());
    } else {
        println!("   {} Expected {} fetches, saw {}", "❌".red(), rounds, fetches);
    }

    Ok(())
}
