mod commands;
mod context;
mod input;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::batch::BatchArgs;
use commands::evaluate::EvaluateArgs;
use commands::tables::{WeightsArgs, ZonesArgs};
use commands::trend::TrendArgs;

/// Bankruptcy-risk scoring for company-year financial records
#[derive(Parser)]
#[command(
    name = "zrisk",
    version,
    about = "Bankruptcy-risk scoring for company-year financial records",
    long_about = "Derives the five Altman-style solvency ratios from financial statement \
                  fields, scores them with a pre-fitted discriminant model and an \
                  industry-weighted Z-Score, and classifies each record into a risk zone. \
                  Supports single records, CSV/JSON portfolios and per-company trends."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand
#[derive(Args)]
pub struct GlobalArgs {
    /// Output format
    #[arg(long, default_value = "json", global = true)]
    pub output: OutputFormat,

    /// Engine configuration file (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Fitted scaler artifact (JSON)
    #[arg(long, global = true)]
    pub scaler: Option<String>,

    /// Fitted classifier artifact (JSON)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single company-year record
    Evaluate(EvaluateArgs),
    /// Score a portfolio of records from CSV or JSON
    Batch(BatchArgs),
    /// Drill down industry → company → year range and show the risk trend
    Trend(TrendArgs),
    /// Show the active risk-zone bands
    Zones(ZonesArgs),
    /// Show the active industry weight table
    Weights(WeightsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args, &cli.global),
        Commands::Batch(args) => commands::batch::run_batch(args, &cli.global),
        Commands::Trend(args) => commands::trend::run_trend(args, &cli.global),
        Commands::Zones(args) => commands::tables::run_zones(args, &cli.global),
        Commands::Weights(args) => commands::tables::run_weights(args, &cli.global),
        Commands::Version => {
            println!("zrisk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.global.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
