//! Policy Rule Analyzer CLI
//!
//! Reads an analysis request (JSON or YAML), runs the full analysis and prints
//! the report as JSON.

use policy_rule_analyzer::{AnalysisRequest, Config, RuleAnalyzer};

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Policy Rule Analyzer
#[derive(Parser, Debug)]
#[command(name = "policy-analyzer")]
#[command(about = "Detect conflicts and recommend improvements for content-inspection rules")]
#[command(version)]
struct Args {
    /// Analysis request file (JSON or YAML)
    #[arg(short, long, env = "ANALYSIS_INPUT")]
    input: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log format
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Disable the conflict cache
    #[arg(long)]
    no_cache: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::from_env().context("loading configuration")?,
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.telemetry.log_level.clone());
    init_logging(&level, args.json_logs || config.telemetry.json_logs)?;

    info!(
        service = %config.telemetry.service_name,
        version = policy_rule_analyzer::VERSION,
        "Starting rule analysis"
    );

    let request = AnalysisRequest::from_file(&args.input)
        .with_context(|| format!("reading analysis request {}", args.input.display()))?;
    for skipped in request.rules.skipped() {
        warn!(rule_id = %skipped.id, reason = %skipped.reason, "Rule not analysed");
    }

    let mut builder = RuleAnalyzer::builder().with_config(config);
    if args.no_cache {
        builder = builder.with_cache_enabled(false);
    }
    let analyzer = builder.build()?;

    let report = analyzer.analyze(&request);
    info!(
        conflicts = report.summary.total_conflicts,
        recommendations = report.summary.total_recommendations,
        gaps = report.summary.total_coverage_gaps,
        critical = report.summary.critical_issues,
        "Analysis complete"
    );

    let output = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output)?;
    Ok(())
}

/// Initialize the logging system. Logs go to stderr so stdout carries only the report.
fn init_logging(level: &str, json_format: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = if json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))
}
