mod fs_backend;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use kvchain_codecs::codec_by_name;
use kvchain_core::format::{
    DEFAULT_BASE_KEY, DEFAULT_MAX_HOPS, DEFAULT_MAX_VALUE_SIZE, DEFAULT_METADATA_OVERHEAD,
};
use kvchain_core::{ChainStore, Record, StoreConfig};

use fs_backend::FsBackend;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "kvchain",
    about = "Append to, list, inspect, and clear a chunked record store kept in a directory",
    version
)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Directory holding one file per stored key
    #[arg(short, long, global = true, default_value = "./kvchain-data")]
    dir: PathBuf,
    /// Codec to use: zstd | lz4 | deflate (must match the one used to write)
    #[arg(short, long, global = true, default_value = "zstd")]
    codec: String,
    /// Compression level (zstd 1–22, deflate 0–9; ignored by lz4)
    #[arg(long, global = true)]
    level: Option<i32>,
    /// Key of the first block of the chain
    #[arg(long, global = true, default_value = DEFAULT_BASE_KEY)]
    base_key: String,
    /// Largest value, in bytes, a single key may hold
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_VALUE_SIZE)]
    max_value_size: usize,
    /// Bytes of each value reserved for the block envelope
    #[arg(long, global = true, default_value_t = DEFAULT_METADATA_OVERHEAD)]
    metadata_overhead: usize,
    /// Most blocks a read will fetch before giving up
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_HOPS)]
    max_hops: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Append one record to the collection
    Append {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        /// Message body ("-" reads stdin)
        #[arg(long)]
        body: String,
        #[arg(long)]
        category: Option<String>,
        /// Tag to attach; repeat for several
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Print every stored record
    List {
        /// Print the collection as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Reset the collection to empty
    Clear,
    /// Print per-block chain metadata without decoding the payload
    Inspect,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn preview(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > width || text.contains('\n') {
        let cut: String = line.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

async fn open_store(args: &StoreArgs) -> anyhow::Result<ChainStore> {
    debug!(dir = ?args.dir, codec = %args.codec, base_key = %args.base_key, "opening store");
    let backend = FsBackend::open(&args.dir)
        .await
        .with_context(|| format!("opening store directory {:?}", args.dir))?
        .with_max_value_size(args.max_value_size);
    let codec = codec_by_name(&args.codec, args.level)?;
    let config = StoreConfig {
        base_key: args.base_key.clone(),
        max_value_size: args.max_value_size,
        metadata_overhead: args.metadata_overhead,
        max_hops: args.max_hops,
    };
    Ok(ChainStore::new(Arc::new(backend), codec, config)?)
}

// ── Subcommand implementations ─────────────────────────────────────────────

async fn run_append(store: &ChainStore, record: Record) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let summary = store.append(record).await.context("appending record")?;

    eprintln!("  codec       : {}", store.codec().name());
    eprintln!("  blocks      : {}", summary.total_blocks);
    eprintln!("  payload     : {}", human_bytes(summary.payload_len as u64));
    if summary.blanked > 0 {
        eprintln!("  blanked     : {} stale keys", summary.blanked);
    }
    eprintln!("  elapsed     : {:.3}s", t0.elapsed().as_secs_f64());
    Ok(())
}

async fn run_list(store: &ChainStore, json: bool) -> anyhow::Result<()> {
    let records = store
        .try_read_all()
        .await
        .with_context(|| format!("reading chain {:?}", store.config().base_key))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "  {:>4}  {:<20}  {:<24}  {:<28}  {:<24}",
        "#", "received", "from", "email", "subject"
    );
    println!("  {}", "-".repeat(108));
    for (i, r) in records.iter().enumerate() {
        println!(
            "  {:>4}  {:<20}  {:<24}  {:<28}  {:<24}",
            i,
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            preview(&format!("{} {}", r.name, r.surname), 24),
            preview(&r.email, 28),
            preview(&r.subject, 24),
        );
    }
    eprintln!("{} records", records.len());
    Ok(())
}

async fn run_clear(store: &ChainStore) -> anyhow::Result<()> {
    let written = store.clear().await.context("clearing chain")?;
    if written == 0 {
        eprintln!("nothing stored under {:?}", store.config().base_key);
    } else {
        eprintln!("cleared {} keys", written);
    }
    Ok(())
}

async fn run_inspect(store: &ChainStore) -> anyhow::Result<()> {
    let blocks = store.inspect().await?;
    let config = store.config();

    println!("=== Chain: {:?} ===", config.base_key);
    println!();
    println!("  max value size : {}", human_bytes(config.max_value_size as u64));
    println!("  max chunk size : {}", human_bytes(config.max_chunk_size() as u64));
    println!("  block count    : {}", blocks.len());
    let payload: usize = blocks.iter().map(|b| b.data_len).sum();
    println!("  payload        : {}", human_bytes(payload as u64));

    if !blocks.is_empty() {
        println!();
        println!(
            "  {:<28}  {:>6}  {:>8}  {:>6}  {:>12}",
            "key", "index", "hasNext", "total", "data"
        );
        println!("  {}", "-".repeat(68));
        for b in &blocks {
            println!(
                "  {:<28}  {:>6}  {:>8}  {:>6}  {:>12}",
                b.key,
                b.block_index,
                b.has_next,
                b.total_blocks.map_or_else(|| "-".to_string(), |t| t.to_string()),
                human_bytes(b.data_len as u64),
            );
        }
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = open_store(&cli.store).await?;

    match cli.command {
        Commands::Append {
            name,
            surname,
            email,
            subject,
            body,
            category,
            tags,
        } => {
            let body = if body == "-" {
                std::io::read_to_string(std::io::stdin()).context("reading body from stdin")?
            } else {
                body
            };
            let mut record = Record::new(name, surname, email, subject, body);
            if let Some(category) = category {
                record = record.with_category(category);
            }
            if !tags.is_empty() {
                record = record.with_tags(tags);
            }
            run_append(&store, record).await
        }
        Commands::List { json } => run_list(&store, json).await,
        Commands::Clear => run_clear(&store).await,
        Commands::Inspect => run_inspect(&store).await,
    }
}
