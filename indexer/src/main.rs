use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lemmadex_core::persist::{export_all, IndexPaths};
use lemmadex_core::{DocumentSet, EngineConfig, Evaluator, IndexBuilder, InvertedIndex, Normalizer, Query, Scorer, TermKind};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a lemma/surface inverted index and run boolean queries over it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Engine config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stopword file, one word per line
    #[arg(long)]
    stopwords: Option<PathBuf>,
    /// Analyzer dump: token, lemma, score, tag separated by tabs
    #[arg(long)]
    dictionary: Option<PathBuf>,
    /// Indexing threads (default: available parallelism)
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a document directory or JSON/JSONL file and write the dumps
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output directory for the dumps
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Evaluate one boolean query and print matching documents, best first
    Query {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// `<id> <locator>` table used to print results
        #[arg(long)]
        locators: Option<PathBuf>,
        /// Query the surface-token index instead of the lemma index
        #[arg(long, default_value_t = false)]
        surface: bool,
        /// Print at most this many results
        #[arg(long, default_value_t = 20)]
        k: usize,
        #[command(flatten)]
        engine: EngineArgs,
        query: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, engine } => build(&input, &output, &engine),
        Commands::Query { input, locators, surface, k, engine, query } => {
            let kind = if surface { TermKind::Surface } else { TermKind::Lemma };
            run_query(&input, locators.as_ref(), kind, k, &engine, &query)
        }
    }
}

fn engine_config(args: &EngineArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.stopwords.is_some() {
        config.stopwords_path = args.stopwords.clone();
    }
    if args.dictionary.is_some() {
        config.dictionary_path = args.dictionary.clone();
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    Ok(config)
}

fn load_index(input: &Path, args: &EngineArgs) -> Result<(DocumentSet, Normalizer, InvertedIndex)> {
    let config = engine_config(args)?;
    let normalizer = config.normalizer()?;
    let documents = DocumentSet::load(input)?;
    let index = IndexBuilder::new(&normalizer).threads(config.threads).build(&documents.texts);
    Ok((documents, normalizer, index))
}

fn build(input: &Path, output: &Path, args: &EngineArgs) -> Result<()> {
    let (_documents, _normalizer, index) = load_index(input, args)?;
    let report = index.report();
    tracing::info!(
        num_docs = report.documents,
        empty_docs = report.empty_documents,
        oracle_failures = report.tokens.oracle_failures,
        low_confidence = report.tokens.low_confidence,
        "ingested documents"
    );
    export_all(&IndexPaths::new(output), &index)?;
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn run_query(
    input: &Path,
    locators: Option<&PathBuf>,
    kind: TermKind,
    k: usize,
    args: &EngineArgs,
    text: &str,
) -> Result<()> {
    let (mut documents, normalizer, index) = load_index(input, args)?;
    if let Some(path) = locators {
        documents.load_locators(path)?;
    }
    let query = Query::parse(text)?;
    let evaluator = Evaluator::new(&index, &normalizer).kind(kind);
    let matches = evaluator.evaluate_query(&query)?;
    let ranked = Scorer::new(&index).rank(&matches, &evaluator.terms(&query), kind);

    println!("{} matching documents", ranked.len());
    for hit in ranked.iter().take(k) {
        let locator = documents.locator(hit.doc_id).unwrap_or("-");
        println!("{:>6}  {:>10.6}  {}", hit.doc_id, hit.score, locator);
    }
    Ok(())
}
