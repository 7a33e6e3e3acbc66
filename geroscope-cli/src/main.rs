//! Geroscope CLI: annotate journal abstracts with an LLM and score the
//! annotations against a human-labeled validation table.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Geroscope: LLM-assisted abstract annotation and accuracy scoring
#[derive(Parser, Debug)]
#[command(name = "geroscope", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./geroscope.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Classify abstracts from a CSV file with the configured model
    Annotate {
        /// Input CSV containing the abstracts
        #[arg(short, long)]
        input: PathBuf,

        /// Column holding the abstract text (overrides config)
        #[arg(long)]
        column: Option<String>,

        /// Output CSV for the batch annotations
        #[arg(short, long, default_value = "resultsbatch.csv")]
        output: PathBuf,

        /// Only annotate the first N abstracts
        #[arg(long)]
        limit: Option<usize>,

        /// Classify a random sample of K abstracts and print each record
        /// instead of writing the batch CSV
        #[arg(long)]
        sample: Option<usize>,

        /// Encoding of the input file (any encoding_rs label)
        #[arg(long)]
        encoding: Option<String>,

        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Merge per-rater result tables column-wise into one CSV
    Combine {
        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Input CSV files, merged in argument order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Score a results table against a validation table
    Score {
        /// Results CSV (model annotations, one row per abstract)
        results: PathBuf,

        /// Validation CSV (human annotations, same row order)
        validation: PathBuf,

        /// Encoding of the validation file (overrides config)
        #[arg(long)]
        validation_encoding: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "geroscope", "geroscope")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "geroscope.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = geroscope_core::config::load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    match cli.command {
        Commands::Annotate {
            input,
            column,
            output,
            limit,
            sample,
            encoding,
            model,
        } => {
            commands::annotate(
                &config,
                commands::AnnotateArgs {
                    input,
                    column,
                    output,
                    limit,
                    sample,
                    encoding,
                    model,
                },
            )
            .await
        }
        Commands::Combine { output, inputs } => commands::combine(&inputs, &output),
        Commands::Score {
            results,
            validation,
            validation_encoding,
        } => commands::score(&config, &results, &validation, validation_encoding.as_deref()),
    }
}
