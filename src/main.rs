use analytics::{AnalyticsError, ComparisonEngine};
use anyhow::{Context, Result};
use api_client::{YahooClient, fetch_pair};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use configuration::{Config, load_config};
use core_types::SymbolPair;
use reporter::{DirectorySink, ReportAssembler, RunContext, publish};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the comparator application.
#[tokio::main]
async fn main() -> ExitCode {
    // Environment overrides may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Compare(args) => handle_compare(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AnalyticsError>() {
                Some(failure) => eprintln!(
                    "analysis aborted during {} stage: {}",
                    failure.stage(),
                    failure
                ),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Compares the monthly behaviour of two market symbols.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download two price histories and write the comparison report.
    Compare(CompareArgs),
}

/// Every flag falls back to the loaded configuration.
#[derive(Parser)]
struct CompareArgs {
    /// The first symbol (e.g., "SPY").
    #[arg(long)]
    symbol1: Option<String>,

    /// The second symbol (e.g., "TLT").
    #[arg(long)]
    symbol2: Option<String>,

    /// The start date for data download (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The end date for data download (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Trailing window, in months, of the rolling correlation.
    #[arg(long)]
    rolling_window: Option<usize>,

    /// Directory under which the `analysis_<timestamp>` folder is created.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CompareArgs {
    /// Layers the command-line flags over the loaded configuration.
    fn apply(self, mut config: Config) -> Result<Config> {
        let analysis = &mut config.analysis;
        if let Some(symbol) = self.symbol1 {
            analysis.symbol1 = symbol;
        }
        if let Some(symbol) = self.symbol2 {
            analysis.symbol2 = symbol;
        }
        if let Some(from) = self.from {
            analysis.from_date = from;
        }
        if let Some(to) = self.to {
            analysis.to_date = to;
        }
        if let Some(window) = self.rolling_window {
            analysis.rolling_window = window;
        }
        if let Some(dir) = self.output_dir {
            config.report.output_root = dir.display().to_string();
        }

        config.validate().context("Invalid command-line arguments")?;
        Ok(config)
    }
}

// ==============================================================================
// Compare Command Logic
// ==============================================================================

/// Handles the orchestration of one comparison run.
async fn handle_compare(args: CompareArgs) -> Result<()> {
    let loaded = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let config = args.apply(loaded)?;
    let output_root = PathBuf::from(&config.report.output_root);
    let _log_guard = init_tracing(&output_root)?;
    log_applied_config(&config);

    let analysis = &config.analysis;
    let started = Local::now().naive_local();
    let ctx = RunContext::new(
        SymbolPair::new(analysis.symbol1.as_str(), analysis.symbol2.as_str()),
        analysis.from_date,
        analysis.to_date,
        started,
    );
    tracing::info!(
        symbol1 = %analysis.symbol1,
        symbol2 = %analysis.symbol2,
        from = %analysis.from_date,
        to = %analysis.to_date,
        "Starting comparison."
    );

    // 1. Acquire both price histories concurrently.
    let client = YahooClient::new(&config.data_source).context("Failed to build HTTP client")?;
    let (first, second) = fetch_pair(
        &client,
        [analysis.symbol1.as_str(), analysis.symbol2.as_str()],
        analysis.from_date,
        analysis.to_date,
    )
    .await;

    // 2. Run the whole analysis before anything is written.
    let report = ComparisonEngine::new(analysis.rolling_window)
        .analyze(&first, &second)
        .inspect_err(|e| tracing::error!(stage = %e.stage(), error = %e, "Analysis aborted."))?;

    // 3. Lay out and render every artifact, then write them in order.
    let artifacts = ReportAssembler::new(config.render.clone()).assemble(&ctx, &report);
    let mut sink = DirectorySink::create(&output_root, &ctx.timestamp)
        .context("Failed to prepare the output directory")?;
    publish(&artifacts, &mut sink).context("Failed to write the report")?;

    println!("Report written to {}", sink.dir().display());
    Ok(())
}

/// Records the effective configuration (file, environment and flags merged).
///
/// Must run after `init_tracing`; nothing is listening before that.
fn log_applied_config(config: &Config) {
    tracing::debug!(?config, "Configuration applied.");
}

/// Logs to stderr and to `comparator.log` under the output root.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(output_root: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(output_root).with_context(|| {
        format!("Failed to create output root '{}'", output_root.display())
    })?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("comparator.log")
        .build(output_root)
        .context("Failed to open the log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(std::io::stderr.and(file_writer))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}
