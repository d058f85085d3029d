//! CNPJ Ingest - bulk loader for the CNPJ open-data release

use anyhow::{Context, Result};
use clap::Parser;
use cnpj_common::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use cnpj_common::text::format_count;
use cnpj_ingest::config::IngestConfig;
use cnpj_ingest::pipeline::{Pipeline, PipelineConfig, RunReport};
use cnpj_ingest::progress::{BarProgress, LogProgress, ProgressObserver};
use cnpj_ingest::remote::HttpRemote;
use cnpj_ingest::sink::{MemorySink, PgTableSink, TableSink};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cnpj-ingest")]
#[command(author, version, about = "Download the CNPJ open data and load it into PostgreSQL")]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Remote directory listing the archives (overrides CNPJ_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Parse and count every file without touching the database
    #[arg(long)]
    dry_run: bool,

    /// Hide the per-archive download bars
    #[arg(long)]
    no_download_progress: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        },
        None => {
            dotenvy::dotenv().ok();
        },
    }

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("cnpj-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let mut config = IngestConfig::from_env().context("Invalid configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.validate()?;
    }

    info!(
        base_url = %config.base_url,
        output_dir = %config.output_dir.display(),
        extract_dir = %config.extract_dir.display(),
        dry_run = cli.dry_run,
        "Starting CNPJ ingestion"
    );

    let progress: Box<dyn ProgressObserver> = match log_config.format {
        LogFormat::Json => Box::new(LogProgress),
        LogFormat::Text => Box::new(BarProgress::new()),
    };

    let remote = HttpRemote::new(&config.base_url, config.probe_timeout())?
        .with_progress(!cli.no_download_progress && log_config.format == LogFormat::Text);

    let mut sink: Box<dyn TableSink> = if cli.dry_run {
        Box::new(MemorySink::counting())
    } else {
        let sink = PgTableSink::connect(config.database.connect_options())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to PostgreSQL at {}:{}",
                    config.database.host, config.database.port
                )
            })?;
        Box::new(sink)
    };

    let report = Pipeline::new(PipelineConfig::from(&config), &remote, sink.as_mut(), progress.as_ref())
        .run()
        .await
        .context("Ingestion aborted")?;

    if let Some(path) = &cli.report_json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote run report");
    }

    print_summary(&report, cli.dry_run);

    Ok(())
}

fn print_summary(report: &RunReport, dry_run: bool) {
    println!();
    println!(
        "Archives: {} listed, {} downloaded, {} unchanged",
        report.artifacts,
        report.downloaded.len(),
        report.reused.len()
    );
    for table in &report.tables {
        println!(
            "  {:<16} {:>3} files  {:>15} rows",
            table.table,
            table.files,
            format_count(table.rows)
        );
    }
    println!("  {:<16} {:>25} rows", "total", format_count(report.total_rows()));

    if report.has_failures() {
        warn!(count = report.failures.len(), "Some items failed; see the log for details");
        println!();
        println!("{} item(s) failed:", report.failures.len());
        for failure in &report.failures {
            println!("  [{}] {}: {}", failure.stage, failure.item, failure.error);
        }
    }

    println!();
    if dry_run {
        println!("Dry run finished: every file was parsed, nothing was written.");
    } else {
        println!("Load finished: the CNPJ tables are ready in the database.");
    }
}
