use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docqa_core::chunker::Chunker;
use docqa_core::config::{Config, Settings};
use docqa_core::extract::{list_documents, ExtractorChain};
use docqa_core::traits::Embedder;
use docqa_embed::build_embedder;
use docqa_hybrid::{HybridStore, SharedStore};
use docqa_rag::{AnswerPipeline, FallbackGenerator, Ingestor};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about your documents with hybrid dense + BM25 retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Extra TOML config merged over config.toml
    #[arg(long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index files or directories (recursively)
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Answer one or more questions from the indexed documents
    Ask {
        query: String,

        /// Chunks retrieved per question (default: retrieval.top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show retrieved chunks without generating an answer
    Search {
        query: String,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long, value_enum, default_value = "hybrid")]
        mode: SearchMode,
    },

    /// Print store size, distinct sources and dimension
    Status,

    /// Delete every indexed chunk and the persisted store
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchMode {
    Hybrid,
    Dense,
    Lexical,
}

fn init_tracing(verbose: u8) {
    let default = if verbose > 0 { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(settings: &Settings) -> Result<SharedStore> {
    let store = HybridStore::open(&settings.store)
        .with_context(|| format!("opening store at {}", settings.store.dir_path().display()))?;
    Ok(SharedStore::new(store))
}

fn load_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::from(build_embedder(&settings.embedder, settings.store.dim)?))
}

fn expand_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|p| if p.is_dir() { list_documents(p) } else { vec![p.clone()] })
        .collect()
}

fn ingest(settings: &Settings, paths: &[PathBuf]) -> Result<()> {
    let files = expand_inputs(paths);
    if files.is_empty() {
        bail!("no files found under the given paths");
    }
    let store = open_store(settings)?;
    let chunker = Chunker::cl100k(settings.chunking)?;
    let ingestor = Ingestor::new(ExtractorChain::default(), chunker, load_embedder(settings)?, store.clone())
        .with_workers(settings.ingest.workers);

    info!(files = files.len(), workers = settings.ingest.workers, "Ingesting");
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );
    let report = ingestor.ingest_many_with(&files, |item| {
        pb.set_message(item.file_name().to_string());
        pb.inc(1);
    });
    pb.finish_with_message(format!("{} indexed, {} failed", report.successful, report.failed));

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.successful == 0 {
        bail!("every document failed to ingest");
    }
    Ok(())
}

fn ask(settings: &Settings, query: &str, top_k: Option<usize>) -> Result<()> {
    let store = open_store(settings)?;
    if store.is_empty() {
        tracing::warn!("Store is empty; answers will have no context");
    }
    let generator = FallbackGenerator::from_settings(&settings.generators)?;
    let pipeline = AnswerPipeline::new(
        load_embedder(settings)?,
        store,
        Box::new(generator),
        top_k.unwrap_or(settings.retrieval.top_k),
    );
    let result = pipeline.answer_multiple(query);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn search(settings: &Settings, query: &str, top_k: Option<usize>, mode: SearchMode) -> Result<()> {
    let store = open_store(settings)?;
    let k = top_k.unwrap_or(settings.retrieval.top_k);
    let vector = match mode {
        SearchMode::Lexical => None,
        SearchMode::Dense | SearchMode::Hybrid => Some(load_embedder(settings)?.embed_one(query)?),
    };
    let hits = {
        let guard = store.read();
        match (mode, vector.as_deref()) {
            (SearchMode::Dense, Some(v)) => guard.search_dense_hits(v, k)?,
            (SearchMode::Hybrid, Some(v)) => guard.hybrid_search_hits(v, query, k)?,
            _ => guard.search_lexical_hits(query, k)?,
        }
    };
    if hits.is_empty() {
        println!("No results.");
    }
    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.chunk.text.chars().take(160).collect();
        println!(
            "{:>2}. [{:?}] score={:.4} {}\n    {}",
            i + 1,
            hit.source,
            hit.score,
            hit.chunk.chunk_id,
            preview.replace('\n', " ")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load_with(cli.config.as_deref()).context("loading configuration")?;
    let settings = config.settings()?;

    match cli.command {
        Commands::Ingest { paths } => ingest(&settings, &paths),
        Commands::Ask { query, top_k } => ask(&settings, &query, top_k),
        Commands::Search { query, top_k, mode } => search(&settings, &query, top_k, mode),
        Commands::Status => {
            let store = open_store(&settings)?;
            println!("{}", serde_json::to_string_pretty(&store.stats())?);
            Ok(())
        }
        Commands::Reset => {
            // Skips loading so a corrupt store can still be cleared.
            let mut store = HybridStore::new(settings.store.dim, settings.store.index_path(), settings.store.meta_path())?;
            store.reset()?;
            println!("Store cleared: {}", settings.store.dir_path().display());
            Ok(())
        }
    }
}
