//! CLI entry point for the weight-gain analyzer.
//!
//! Provides subcommands for analyzing a weighing file, listing per-animal
//! summaries, and exporting the filtered set as CSV.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use weight_gain_analyzer::{
    analyzers::{
        compare::GroupStats,
        filter::FilterState,
        stats::StatsSummary,
        tiers::PerformanceTiers,
    },
    export::{export_to_dir, json_pretty},
    ingest::InputFormat,
    session::AnalysisSession,
};

#[derive(Parser)]
#[command(name = "weight_gain_analyzer")]
#[command(about = "A tool to analyze animal weighing records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Only include animals at this location
    #[arg(short, long)]
    location: Option<String>,

    /// Only include animals in this age bracket (e.g. "12-18", "24+")
    #[arg(short, long)]
    age: Option<String>,

    /// Only include animals of this sex (e.g. "M", "F")
    #[arg(short, long)]
    sex: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> FilterState {
        FilterState::new(
            self.location.clone(),
            self.age.clone(),
            self.sex.as_deref().map(|s| s.trim().to_uppercase()),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a weighing file and print statistics as JSON
    Analyze {
        /// Path to a CSV or XLSX/XLS file
        #[arg(value_name = "FILE")]
        source: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the filtered per-animal summaries as JSON
    Summaries {
        /// Path to a CSV or XLSX/XLS file
        #[arg(value_name = "FILE")]
        source: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export the filtered set as CSV with a filter-derived filename
    Export {
        /// Path to a CSV or XLSX/XLS file
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Directory to write the export into
        #[arg(short, long, default_value = "exports")]
        output_dir: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Everything the analyze subcommand reports, in one JSON document.
#[derive(Serialize)]
struct AnalysisReport {
    total_animals: usize,
    filtered_animals: usize,
    stats: Option<StatsSummary>,
    comparative_by_sex: Vec<GroupStats>,
    comparative_by_age: Vec<GroupStats>,
    performance_tiers: Option<PerformanceTiers>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/weight_gain_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("weight_gain_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { source, filters } => {
            let mut session = load_session(&source).await?;
            let filter = filters.to_filter();

            let report = AnalysisReport {
                total_animals: session.animal_count(),
                filtered_animals: session.summaries(&filter).len(),
                stats: session.stats(&filter).map(|s| (*s).clone()),
                comparative_by_sex: session.comparative_by_sex(&filter),
                comparative_by_age: session.comparative_by_age(&filter),
                performance_tiers: session.performance_tiers(&filter),
            };
            println!("{}", json_pretty(&report)?);
        }
        Commands::Summaries { source, filters } => {
            let mut session = load_session(&source).await?;
            let filter = filters.to_filter();
            let summaries = session.summaries(&filter);
            println!("{}", json_pretty(&*summaries)?);
        }
        Commands::Export {
            source,
            output_dir,
            filters,
        } => {
            let mut session = load_session(&source).await?;
            let filter = filters.to_filter();
            let filtered = session.summaries(&filter);
            let path = export_to_dir(&output_dir, &filtered, &filter)?;
            info!(path = %path.display(), "Export complete");
        }
    }

    Ok(())
}

/// Reads the source file and runs the ingestion pipeline. File reading is
/// the only suspension point; everything downstream is synchronous.
#[tracing::instrument(fields(source = %path.display()))]
async fn load_session(path: &Path) -> Result<AnalysisSession> {
    let format = InputFormat::from_path(path)
        .ok_or_else(|| anyhow::anyhow!("unsupported file type: {}", path.display()))?;
    let bytes = tokio::fs::read(path).await?;

    let mut session = AnalysisSession::new();
    let animals = session.load_bytes(format, &bytes)?;
    info!(animals, "File processed");
    Ok(session)
}
