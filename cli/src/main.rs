//! `semlookup`: embed a folder of documents, then query it by similarity.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use semlookup_embeddings::{Batching, EmbeddingClient, Provider, SimilarityResult};
use semlookup_runs::{
    AppConfig, Credentials, RunStore, Runner, inputs_from_texts, read_inputs_from_dir,
};
use strum::IntoEnumIterator;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "semlookup",
    version,
    about = "Embed texts with a remote provider and find the most similar ones"
)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./semlookup.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate embeddings and store them as a new run.
    Embed(EmbedArgs),

    /// Rank the entries of a stored run by similarity to one of its labels.
    Search(SearchArgs),

    /// List supported providers and their models.
    Providers,

    /// List stored runs.
    Runs,
}

#[derive(Debug, Args)]
struct EmbedArgs {
    /// Provider id, e.g. `openai`, `ollama` or `voyage`.
    #[arg(long)]
    provider: String,

    /// Model id accepted by the provider.
    #[arg(long)]
    model: String,

    /// Embed every file in this directory, labeled by file name.
    #[arg(long, conflicts_with = "texts")]
    input_dir: Option<PathBuf>,

    /// Texts to embed, labeled by position.
    #[arg(required_unless_present = "input_dir")]
    texts: Vec<String>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Run id as printed by `embed`.
    #[arg(long)]
    run: String,

    /// Label of the entry to compare against.
    #[arg(long)]
    target: String,

    /// Number of results (defaults to `default_top_k` from the configuration).
    #[arg(short)]
    k: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {e}");
    }

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .await
        .context("failed to load configuration")?;

    match cli.command {
        Command::Embed(args) => embed(&config, args).await,
        Command::Search(args) => search(&config, args).await,
        Command::Providers => {
            for provider in Provider::iter() {
                println!("{}", describe_provider(provider));
            }
            Ok(())
        }
        Command::Runs => {
            let store = RunStore::new(config.history_dir.clone());
            for run in store.list_runs().await? {
                println!("{run}");
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_runner(config: &AppConfig) -> Result<Runner> {
    let client_config = config.client_config(&Credentials::from_env())?;
    let client = EmbeddingClient::new(client_config)?;
    Ok(Runner::new(
        Arc::new(client),
        RunStore::new(config.history_dir.clone()),
    ))
}

async fn embed(config: &AppConfig, args: EmbedArgs) -> Result<()> {
    let inputs = match &args.input_dir {
        Some(dir) => read_inputs_from_dir(dir)
            .await
            .with_context(|| format!("failed to read inputs from {}", dir.display()))?,
        None => inputs_from_texts(args.texts),
    };

    let runner = build_runner(config)?;
    let record = runner
        .embed(&args.provider, &args.model, &inputs)
        .await
        .with_context(|| format!("failed to embed with {}/{}", args.provider, args.model))?;

    match record {
        Some(record) => {
            println!("{}", record.id);
            if let Some(first) = inputs.first() {
                eprintln!(
                    "Stored in {}. Query it with: semlookup search --run {} --target {}",
                    record.path.display(),
                    record.id,
                    shell_quote(&first.label)
                );
            }
        }
        None => eprintln!("Nothing to embed."),
    }
    Ok(())
}

async fn search(config: &AppConfig, args: SearchArgs) -> Result<()> {
    let k = args.k.unwrap_or(config.default_top_k);
    let runner = build_runner(config)?;
    let results = runner
        .search(&args.run, &args.target, k)
        .await
        .with_context(|| format!("failed to search run {}", args.run))?;

    print!("{}", format_results(&results));
    Ok(())
}

fn format_results(results: &[SimilarityResult]) -> String {
    results
        .iter()
        .map(|result| format!("{}\t{:.6}\n", result.label, result.score))
        .collect()
}

/// Quote `value` for a POSIX shell so the printed command can be pasted as is.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn describe_provider(provider: Provider) -> String {
    let descriptor = provider.descriptor();
    let batching = match descriptor.batching {
        Batching::Batch => "batch",
        Batching::Single => "single",
    };
    format!("{provider}\t{batching}\t{}", descriptor.models.join(", "))
}
