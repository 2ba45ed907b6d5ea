//! Page Analyzer main entry point
//!
//! This is the command-line interface for the page analyzer.

use clap::Parser;
use page_analyzer::config::{load_config_with_hash, Config, OutputFormat};
use page_analyzer::output::{
    emit, render_error, render_report, write_markdown_report, AnalysisReport, ErrorReport,
};
use page_analyzer::{parse_base_url, Analyzer, AnalyzerError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Page Analyzer: structural analysis of a single web page
///
/// Fetches the page, reports its HTML version, title, heading counts,
/// internal and external links and login-form presence, and probes every link
/// for reachability.
#[derive(Parser, Debug)]
#[command(name = "page-analyzer")]
#[command(version = "1.0.0")]
#[command(about = "Structural analysis of a single web page", long_about = None)]
struct Cli {
    /// URL of the page to analyze (http or https)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Report format: text, json or markdown (overrides the config file)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Write the report to this file instead of stdout (overrides the config file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Abort the analysis after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline_secs: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load_configuration(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let format = cli.format.unwrap_or(config.output.format);
    let output = cli.output.clone().or_else(|| config.output.report_path.clone());

    // Reject bad input before any work is scheduled
    if let Err(e) = parse_base_url(&cli.url) {
        let error = AnalyzerError::from(e);
        tracing::error!("Invalid URL {}: {}", cli.url, error);
        report_error(&ErrorReport::rejected("failed to validate request", &error));
        return ExitCode::from(2);
    }

    match handle_analyze(&cli, &config, format, output).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("Analysis could not be reported: {}", e);
            report_error(&ErrorReport::from_error("failed to analyze web page", &e));
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_analyzer=info,warn"),
            1 => EnvFilter::new("page_analyzer=debug,info"),
            2 => EnvFilter::new("page_analyzer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file if one was given, otherwise the defaults
fn load_configuration(cli: &Cli) -> Result<Config, AnalyzerError> {
    let Some(path) = &cli.config else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Cancels `token` on Ctrl-C or when the deadline passes
fn spawn_cancellation(token: CancellationToken, deadline: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = token.cancelled() => return,
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => tracing::warn!("Interrupt received, cancelling analysis"),
                Err(e) => {
                    tracing::error!("Failed to listen for interrupt: {}", e);
                    return;
                }
            },
            _ = deadline => tracing::warn!("Deadline reached, cancelling analysis"),
        }

        token.cancel();
    });
}

/// Runs the analysis and writes the report
///
/// # Returns
///
/// * `Ok(true)` - The analysis completed and the report was written
/// * `Ok(false)` - The analysis failed; the report with its error was written
/// * `Err(AnalyzerError)` - The report could not be produced
async fn handle_analyze(
    cli: &Cli,
    config: &Config,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<bool, AnalyzerError> {
    let analyzer = Analyzer::from_config(config)?;

    let token = CancellationToken::new();
    spawn_cancellation(token.clone(), cli.deadline_secs.map(Duration::from_secs));

    tracing::info!(
        "Analyzing {} ({} analysis workers, {} concurrent link probes)",
        cli.url,
        analyzer.analysis_workers(),
        config.analyzer.probe_concurrency
    );

    let outcome = analyzer.analyze(&token, &cli.url).await;
    token.cancel();

    if let Some(error) = &outcome.error {
        tracing::error!("Analysis failed: {}", error);
    }

    let report = AnalysisReport::from_outcome(&cli.url, &outcome);
    match (format, output.as_deref()) {
        (OutputFormat::Markdown, Some(path)) => {
            write_markdown_report(&report, path)?;
            tracing::info!("Report written to {}", path.display());
        }
        (format, path) => emit(&render_report(&report, format)?, path)?,
    }

    Ok(report.is_success())
}

/// Prints an error payload to stdout
fn report_error(error: &ErrorReport) {
    match render_error(error) {
        Ok(json) => print!("{}", json),
        Err(e) => tracing::error!("Failed to encode error report: {}", e),
    }
}
