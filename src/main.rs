//! repochunk - boundary-aware chunk index of a git repository
//!
//! Entry point for the `repochunk` command.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use repochunk::config::Credentials;
use repochunk::indexer::{change_callbacks, ChunkStore, IncrementalIndexer, IndexerStats};
use repochunk::metrics::{gather_text, init_metrics};
use repochunk::observability::init_tracing;
use repochunk::repo::{sync_in_background, RepositoryRegistry};
use repochunk::splitter::{BoundaryAwareSplitter, DetectorRegistry, SplitterConfig};
use repochunk::storage::{init_storage, Database};
use repochunk::{Config, Error, Result};

/// repochunk - boundary-aware chunk index of a git repository
#[derive(Parser, Debug)]
#[command(name = "repochunk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for repository checkouts and chunk databases
    #[arg(short, long, env = "REPOCHUNK_DATA_DIR", default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "REPOCHUNK_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "REPOCHUNK_LOG_JSON", global = true)]
    log_json: bool,

    /// Maximum chunk size in characters
    #[arg(long, env = "REPOCHUNK_CHUNK_SIZE", default_value = "800", global = true)]
    chunk_size: usize,

    /// Overlap between fallback chunks in characters
    #[arg(long, env = "REPOCHUNK_CHUNK_OVERLAP", default_value = "120", global = true)]
    chunk_overlap: usize,

    /// Username for HTTPS remotes
    #[arg(long, env = "REPOCHUNK_USERNAME", global = true)]
    username: Option<String>,

    /// Personal access token for HTTPS remotes
    #[arg(long, env = "REPOCHUNK_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Print Prometheus metrics before exiting
    #[arg(long, env = "REPOCHUNK_PRINT_METRICS", global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clone or open a repository, index it, and apply upstream changes
    Sync {
        /// Remote repository URL (https or file)
        url: String,

        /// Keep polling upstream every SECS seconds until Ctrl-C
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },

    /// Print the chunks of one file as JSON
    Split {
        /// File to split
        file: PathBuf,

        /// Source name recorded in chunk metadata (defaults to the path)
        #[arg(long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);
    init_metrics();

    let config = Config {
        data_dir: cli.data_dir,
        log_level: cli.log_level,
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
        credentials: Credentials::from_parts(cli.username, cli.token),
        ..Config::default()
    };

    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    match cli.command {
        Command::Sync { url, interval } => {
            run_sync(&config, &url, interval.map(Duration::from_secs)).await?;
        }
        Command::Split { file, source } => run_split(&config, &file, source)?,
    }

    if cli.print_metrics {
        print!("{}", gather_text());
    }
    Ok(())
}

async fn run_sync(config: &Config, url: &str, interval: Option<Duration>) -> Result<()> {
    tracing::info!(
        "repochunk v{} syncing into {}",
        env!("CARGO_PKG_VERSION"),
        config.data_dir.display()
    );

    let registry = RepositoryRegistry::new(config.repos_dir(), config.credentials.clone());
    let source = {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || registry.get_or_open(&url))
            .await
            .map_err(|e| Error::internal(format!("Open task failed: {e}")))??
    };

    let db = Database::open(config.database_path(source.key()))?;
    init_storage(&db)?;
    let store: Arc<dyn ChunkStore> = Arc::new(db.clone());

    let indexer = Arc::new(IncrementalIndexer::new(source.local_path(), store, config)?);
    let report = {
        let indexer = Arc::clone(&indexer);
        tokio::task::spawn_blocking(move || indexer.ingest())
            .await
            .map_err(|e| Error::internal(format!("Ingest task failed: {e}")))??
    };
    tracing::info!(
        repo = source.name(),
        head = %source.head(),
        indexed = report.files_indexed,
        chunks = report.chunks_written,
        "Initial ingest done"
    );

    let stats = IndexerStats::new();
    let callbacks = Arc::new(change_callbacks(indexer, Arc::clone(&stats)));

    loop {
        match sync_in_background(Arc::clone(&source), Arc::clone(&callbacks)).await {
            Ok(report) if report.is_unchanged() => {
                tracing::debug!(repo = source.name(), head = %report.current_head, "Up to date");
            }
            Ok(report) => tracing::info!(
                repo = source.name(),
                head = %report.current_head,
                changes = report.changes.len(),
                failures = report.callback_failures,
                "Applied upstream changes"
            ),
            Err(e) if interval.is_some() => {
                tracing::warn!(repo = source.name(), error = %e, "Sync failed, retrying next tick");
            }
            Err(e) => return Err(e),
        }

        let Some(period) = interval else { break };
        tokio::select! {
            () = tokio::time::sleep(period) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            }
        }
    }

    let snapshot = stats.snapshot();
    let stored = db.chunk_count()?;
    tracing::info!(
        indexed = snapshot.files_indexed,
        removed = snapshot.files_removed,
        chunks = snapshot.chunks_written,
        errors = snapshot.errors,
        stored,
        "Sync finished"
    );
    Ok(())
}

fn run_split(config: &Config, file: &Path, source: Option<String>) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let source = source.unwrap_or_else(|| file.display().to_string());

    let splitter = BoundaryAwareSplitter::new(SplitterConfig::from(config))?;
    let documents = splitter.split_file(&source, &text, &DetectorRegistry::with_defaults());

    let json = serde_json::to_string_pretty(&documents)
        .map_err(|e| Error::internal(format!("Failed to encode documents: {e}")))?;
    println!("{json}");
    Ok(())
}
