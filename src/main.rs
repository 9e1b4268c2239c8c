use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use proxima::index::{build_from_directory, open_index, IndexKind};
use proxima::output::{print_postings, print_ranking};
use proxima::query::{CancellationToken, ProximityEngine};
use proxima::utils::Config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "proxima")]
#[command(about = "Positional inverted index with proximity and phrase ranking")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a directory of text files
    Index {
        /// Directory holding the documents
        collection: PathBuf,

        /// Directory the index is written to
        index_dir: PathBuf,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Rank documents by term proximity; wrap the query in quotes for a phrase
    Search {
        index_dir: PathBuf,

        /// Query terms
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        cutoff: Option<usize>,

        /// Decode the whole index up front instead of on demand
        #[arg(long)]
        memory: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show the postings of one term
    Postings {
        index_dir: PathBuf,

        term: String,

        /// Maximum number of postings shown
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show index statistics
    Stats { index_dir: PathBuf },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Index {
            collection,
            index_dir,
            no_progress,
        } => {
            if no_progress {
                config.build.progress = false;
            }
            let summary = build_from_directory(&collection, &index_dir, &config.build)?;
            println!(
                "Indexed {} documents ({} terms, {} skipped) into {}",
                summary.documents,
                summary.terms,
                summary.skipped,
                summary.index_path.display()
            );
        }
        Commands::Search {
            index_dir,
            query,
            cutoff,
            memory,
            no_color,
        } => {
            let kind = if memory { IndexKind::Memory } else { config.index.kind };
            let index = open_index(&index_dir, kind, &config.index)
                .with_context(|| format!("Failed to open index at {}", index_dir.display()))?;

            // Collection terms are lowercased when indexed
            let query = query.join(" ").to_lowercase();
            let cutoff = cutoff.unwrap_or(config.search.default_cutoff);

            let engine = ProximityEngine::with_config(index.as_ref(), config.search.clone());
            let (ranking, _stats) = engine.search_with(&query, cutoff, &CancellationToken::new())?;

            if ranking.is_empty() {
                println!("No results");
            } else {
                print_ranking(index.as_ref(), &ranking, !no_color)?;
            }
        }
        Commands::Postings {
            index_dir,
            term,
            limit,
            no_color,
        } => {
            let index = open_index(&index_dir, config.index.kind, &config.index)
                .with_context(|| format!("Failed to open index at {}", index_dir.display()))?;
            print_postings(index.as_ref(), &term.to_lowercase(), limit, !no_color)?;
        }
        Commands::Stats { index_dir } => {
            proxima::index::stats::show_stats(&index_dir)?;
        }
    }

    Ok(())
}
