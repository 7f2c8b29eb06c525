use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ironpipe_core::{Pipeline, StageSpec};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ironpipe")]
#[command(about = "IronPipe CLI - Build and check aggregation pipelines from JSON stage specs")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the database statement of a pipeline file
    Export {
        /// JSON file holding an array of stage specs
        file: PathBuf,
        /// Pretty-print the statement
        #[arg(long)]
        pretty: bool,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build every stage of a pipeline file and report problems
    Validate {
        /// JSON file holding an array of stage specs
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Export {
            file,
            pretty,
            output,
        } => export_pipeline(&file, pretty, output.as_deref()),
        Commands::Validate { file } => validate_pipeline(&file),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

/// Read and build a pipeline
/// Format: [{"match": {"query": {...}}}, {"limit": {"value": 10}}, ...]
fn load_pipeline(file: &Path) -> Result<Pipeline> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let specs: Vec<StageSpec> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid stage specs in file: {}", file.display()))?;
    debug!(stages = specs.len(), file = %file.display(), "parsed stage specs");

    Pipeline::from_specs(specs)
        .with_context(|| format!("Invalid pipeline in file: {}", file.display()))
}

fn render(pipeline: &Pipeline, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(pipeline)
    } else {
        serde_json::to_string(pipeline)
    };
    json.with_context(|| "Failed to serialize pipeline")
}

fn export_pipeline(file: &Path, pretty: bool, output: Option<&Path>) -> Result<()> {
    let pipeline = load_pipeline(file)?;
    let json = render(&pipeline, pretty)?;

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            eprintln!(
                "Exported {} stages to {}",
                pipeline.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn validate_pipeline(file: &Path) -> Result<()> {
    let pipeline = load_pipeline(file)?;
    println!("{}: {} stages OK", file.display(), pipeline.len());
    for (position, stage) in pipeline.iter().enumerate() {
        println!("  {:>3}  ${}", position, stage.name());
    }
    Ok(())
}
