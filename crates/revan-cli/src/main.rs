mod analyze;
mod batch;

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use revan_analyzer::{Analyzer, OllamaClient};
use revan_core::{AppConfig, TopicVocabulary};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "revan")]
#[command(about = "Analyze product reviews with a locally hosted Ollama model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the model endpoint is reachable and the model is installed
    Health,
    /// Analyze a single review
    Analyze {
        /// Review text to analyze
        #[arg(long)]
        text: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze every review in a CSV file and print a summary report
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// CSV with `product_id`, `product_name`, `review_text` columns
    #[arg(long)]
    input: PathBuf,
    /// Write per-review results as CSV
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write failures as a separate CSV
    #[arg(long)]
    failures_output: Option<PathBuf>,
    /// Append failures to the results CSV as flagged rows
    #[arg(long)]
    include_failures: bool,
    /// Override `REVAN_MAX_CONCURRENT_REVIEWS`
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    concurrency: Option<usize>,
    /// Only analyze the first N reviews
    #[arg(long)]
    limit: Option<usize>,
    /// Load and validate the input without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = revan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Health => analyze::run_health(&config).await,
        Commands::Analyze { text, json } => analyze::run_analyze(&config, &text, json).await,
        Commands::Batch(args) => batch::run_batch_command(&config, &args).await,
    }
}

/// Build the analyzer described by `config`, loading a custom topic
/// vocabulary when `REVAN_TOPICS_PATH` is set.
fn build_analyzer(config: &AppConfig) -> anyhow::Result<Analyzer<OllamaClient>> {
    let vocabulary = match &config.topics_path {
        Some(path) => revan_core::load_topics(path)?,
        None => TopicVocabulary::default(),
    };
    let client = OllamaClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build Ollama client: {e}"))?;
    Ok(Analyzer::from_config(client, config, vocabulary))
}
