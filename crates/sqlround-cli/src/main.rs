use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlround_core::{DatabaseType, OptimizationResult, OptimizerConfig, Provider};
use sqlround_engine::{compare_dialects, QueryOptimizer};
use sqlround_store::{output_path_for, FileHandler, JsonMetadataStore, LocalFileHandler, MetadataStore};

/// Characters of each query and explanation shown in the summary
const PREVIEW_CHARS: usize = 100;

/// SQLRound - SQL optimization through a natural-language round trip
#[derive(Parser)]
#[command(name = "sqlround")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sqlround.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that calls a model
#[derive(Args)]
struct ModelArgs {
    /// LLM provider (gemini, openai, claude, oci)
    #[arg(short, long)]
    provider: Option<Provider>,

    /// Model name (default depends on the provider)
    #[arg(short, long)]
    model: Option<String>,

    /// API key (falls back to config, then the provider's environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Metadata store file
    #[arg(long)]
    metadata: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a SQL file for one database
    Optimize {
        /// SQL file to optimize
        file: PathBuf,

        /// Target database (oracle, sqlite)
        #[arg(short, long)]
        database: Option<DatabaseType>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Optimize a SQL file for two databases side by side
    Compare {
        /// SQL file to optimize
        file: PathBuf,

        /// The two databases to compare
        #[arg(short, long, value_delimiter = ',', default_values = ["oracle", "sqlite"])]
        databases: Vec<DatabaseType>,

        #[command(flatten)]
        model: ModelArgs,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = OptimizerConfig::load_or_default(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Optimize { file, database, model } => {
            optimize_command(config, &file, database, &model, cli.verbose).await
        }
        Commands::Compare { file, databases, model } => {
            compare_command(config, &file, &databases, &model, cli.verbose).await
        }
    }
}

/// Apply command-line overrides on top of the loaded config
fn apply_overrides(mut config: OptimizerConfig, args: &ModelArgs) -> OptimizerConfig {
    if let Some(provider) = args.provider {
        if provider != config.provider {
            // A configured model belongs to the configured provider
            config.model_name = None;
        }
        config.provider = provider;
    }
    if let Some(model) = &args.model {
        config.model_name = Some(model.clone());
    }
    if let Some(metadata) = &args.metadata {
        config.metadata_path = metadata.clone();
    }
    config
}

/// Optimize command - one dialect
async fn optimize_command(
    config: OptimizerConfig,
    file: &Path,
    database: Option<DatabaseType>,
    args: &ModelArgs,
    verbose: bool,
) -> Result<()> {
    let mut config = apply_overrides(config, args);
    if let Some(database) = database {
        config.database_type = database;
    }

    if verbose {
        eprintln!(
            "{} {} ({}) for {}",
            "Using".cyan(),
            config.provider,
            config.effective_model(),
            config.database_type.display_name()
        );
    }

    let llm_client = sqlround_llm::create_client(&config, args.api_key.as_deref())?;
    let metadata_store = Arc::new(JsonMetadataStore::open(&config.metadata_path));

    let optimizer = QueryOptimizer::new(llm_client, Arc::new(LocalFileHandler), metadata_store, config);

    eprintln!("{} {}...", "Optimizing".cyan(), file.display());
    let result = optimizer.optimize_query(file).await?;

    print_result(&result, &optimizer.output_path(file));
    Ok(())
}

/// Compare command - two dialects concurrently
async fn compare_command(
    config: OptimizerConfig,
    file: &Path,
    databases: &[DatabaseType],
    args: &ModelArgs,
    verbose: bool,
) -> Result<()> {
    let config = apply_overrides(config, args);

    let dialects: [DatabaseType; 2] = databases
        .try_into()
        .map_err(|_| anyhow::anyhow!("Expected exactly two databases, got {}", databases.len()))?;

    if verbose {
        eprintln!(
            "{} {} ({}) for {} and {}",
            "Using".cyan(),
            config.provider,
            config.effective_model(),
            dialects[0].display_name(),
            dialects[1].display_name()
        );
    }

    let llm_client = sqlround_llm::create_client(&config, args.api_key.as_deref())?;
    let file_handler: Arc<dyn FileHandler> = Arc::new(LocalFileHandler);
    let metadata_store: Arc<dyn MetadataStore> = Arc::new(JsonMetadataStore::open(&config.metadata_path));

    eprintln!(
        "{} {} for {} and {}...",
        "Optimizing".cyan(),
        file.display(),
        dialects[0],
        dialects[1]
    );
    let comparison = compare_dialects(file, dialects, llm_client, file_handler, metadata_store, &config).await?;

    for result in comparison.results() {
        print_result(result, &output_path_for(file, result.database_type));
    }
    Ok(())
}

fn print_result(result: &OptimizationResult, output_path: &Path) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!(
        "{}",
        format!("{} Optimization", result.database_type.display_name())
            .bold()
            .bright_blue()
    );
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("{}", "Original query:".bold());
    println!("  {}", preview(&result.original_query));
    println!();
    println!("{}", "Explanation:".bold());
    println!("  {}", preview(&result.explained_query).yellow());
    println!();
    println!("{}", "Optimized query:".bold());
    println!("  {}", result.optimized_query.green());
    println!();

    println!("{} {}", "Version:".bold(), result.metadata.version);
    println!(
        "{} {}",
        "Last optimization:".bold(),
        result.metadata.last_optimization.to_rfc3339()
    );
    println!("{} {}", "Output saved to:".green(), output_path.display());
}

/// First `PREVIEW_CHARS` characters, with an ellipsis when truncated
fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
