//! CLI entry point for the search core.
//!
//! Loads a JSON corpus into an in-memory store, builds the embedding index
//! and runs searches against it. Useful for tuning ranking weights and
//! index parameters offline.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use clipmark::display::{create_results_table, create_stats_table};
use clipmark::vector::EmbeddingGenerator;
use clipmark::{
    EmbeddingIndex, FastEmbedGenerator, MemoryStore, Platform, RelevanceRanker, SearchRequest,
    Settings,
};
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Texts per embedding model call when filling missing embeddings.
const EMBED_BATCH_SIZE: usize = 32;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Relevance search over saved videos
#[derive(Parser)]
#[command(
    name = "clipmark",
    version = env!("CARGO_PKG_VERSION"),
    about = "Hybrid relevance search over saved videos",
    long_about = "Recall saved videos by embedding similarity and rank them with lexical match tiers.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Rank the corpus for one user and query
    #[command(about = "Search a corpus as one user")]
    Search {
        /// JSON corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// Requesting user
        #[arg(short, long)]
        user: String,

        /// Free-text query
        #[arg(short, long)]
        query: String,

        /// Restrict to one platform (youtube, instagram, tiktok, facebook)
        #[arg(short, long)]
        platform: Option<String>,

        /// Show at most this many results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute embeddings for items that lack one and write the corpus back
    #[command(about = "Fill missing embeddings in a corpus")]
    Embed {
        /// JSON corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the index from stored embeddings and report on it
    #[command(about = "Show index statistics for a corpus")]
    Stats {
        /// JSON corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// Output statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect the platform of a video URL
    #[command(about = "Detect the platform of a video URL")]
    Detect {
        url: String,
    },

    /// Print the effective configuration
    #[command(about = "Display active settings")]
    Config,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    items: usize,
    embeddings: usize,
    #[serde(flatten)]
    index: clipmark::IndexStats,
}

#[derive(Debug, Serialize)]
struct DetectOutput<'a> {
    url: &'a str,
    platform: Platform,
    video_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Configuration error loading from {}", path.display()))?,
        None => Settings::load().context("Configuration error")?,
    };

    if let Err(e) = clipmark::logging::init(&settings) {
        eprintln!("Warning: logging disabled: {e}");
    }

    match cli.command {
        Commands::Search {
            corpus,
            user,
            query,
            platform,
            limit,
            json,
        } => {
            let store = load_corpus(&corpus)?;
            let generator = Arc::new(load_generator(&settings)?);

            let filled = store
                .fill_missing_embeddings(generator.as_ref(), EMBED_BATCH_SIZE)
                .context("Failed to embed corpus items")?;
            if filled > 0 {
                tracing::info!(filled, "embedded items without a stored embedding");
            }

            let store = Arc::new(store);
            let index = Arc::new(EmbeddingIndex::new(store.clone(), settings.index.options()));
            index
                .try_initialize()
                .await
                .context("Failed to build the embedding index")?;

            let ranker = RelevanceRanker::new(index, store, generator, settings.ranking.clone())
                .with_deadline(settings.search.deadline());

            let mut request = SearchRequest::new(user.as_str(), query);
            if let Some(platform) = platform {
                request = request.with_platform(platform);
            }

            let start = Instant::now();
            let mut results = ranker.search(&request).await;
            let elapsed = start.elapsed();
            if let Some(limit) = limit {
                results.truncate(limit);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No results for '{}'", request.query);
            } else {
                println!("{}", create_results_table(&results));
                println!(
                    "{} results in {elapsed:.2?}",
                    style(results.len()).cyan().bold()
                );
            }
        }

        Commands::Embed { corpus, output } => {
            let store = load_corpus(&corpus)?;
            let generator = load_generator(&settings)?;

            let start = Instant::now();
            let filled = store
                .fill_missing_embeddings(&generator, EMBED_BATCH_SIZE)
                .context("Failed to embed corpus items")?;

            let target = output.as_deref().unwrap_or(&corpus);
            store
                .save_corpus_file(target)
                .with_context(|| format!("Failed to write {}", target.display()))?;

            println!(
                "Embedded {} of {} items in {:.2?} -> {}",
                style(filled).cyan().bold(),
                store.len(),
                start.elapsed(),
                target.display()
            );
        }

        Commands::Stats { corpus, json } => {
            let store = Arc::new(load_corpus(&corpus)?);
            let index = EmbeddingIndex::new(store.clone(), settings.index.options());
            let stats = index
                .try_initialize()
                .await
                .context("Failed to build the embedding index")?;

            if json {
                let output = StatsOutput {
                    items: store.len(),
                    embeddings: store.embedding_count(),
                    index: stats,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", create_stats_table(&stats, store.len()));
                let missing = store.len().saturating_sub(stats.vectors);
                if missing > 0 {
                    println!(
                        "{} items have no usable embedding; run `clipmark embed --corpus {}`",
                        style(missing).yellow().bold(),
                        corpus.display()
                    );
                }
            }
        }

        Commands::Detect { url } => {
            let output = DetectOutput {
                url: &url,
                platform: Platform::detect(&url),
                video_id: Platform::video_id(&url).map(|(_, id)| id),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Config => {
            println!("{}", style("Current Configuration:").cyan().bold());
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

fn load_corpus(path: &Path) -> Result<MemoryStore> {
    let store = MemoryStore::from_corpus_file(path)?;
    tracing::debug!(
        path = %path.display(),
        items = store.len(),
        embeddings = store.embedding_count(),
        "corpus loaded"
    );
    Ok(store)
}

fn load_generator(settings: &Settings) -> Result<FastEmbedGenerator> {
    let cache_dir = settings.model_cache_dir();
    let generator = FastEmbedGenerator::new(
        &settings.embedding.model,
        &cache_dir,
        settings.embedding.show_download_progress,
    )?;
    tracing::info!(
        model = generator.model_name(),
        dimension = generator.dimension().get(),
        "embedding model ready"
    );
    Ok(generator)
}
