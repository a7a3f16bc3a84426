use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use komet::config::{load_lab_config, BackendSettings};
use komet::git_ops::read_snapshot;
use komet::lab::batch::{run_batch, BatchExperimentRow};
use komet::lab::compare::compare_configs;
use komet::lab::metrics::{compute_metrics, MetricsSummary};
use komet::lab::runner::{run_single_experiment, RunOptions};
use komet::logger::{RunLogger, DEFAULT_RUN_LOG_PATH};
use komet::prompt::PromptLibrary;
use komet::providers::Registry;
use komet::types::EngineResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "komet-lab",
    about = "Experiment harness for commit message generation configs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the single target from the lab config once
    Single(SingleArgs),
    /// Expand and run the full batch matrix, then rank configurations
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    #[arg(long, default_value = ".")]
    repo: PathBuf,
    #[arg(long, default_value = "config/lab.toml")]
    config: PathBuf,
    #[arg(long, default_value = "prompts")]
    prompts: PathBuf,
    #[arg(long, default_value = DEFAULT_RUN_LOG_PATH)]
    log: PathBuf,
    #[arg(long)]
    intent: Option<String>,
    #[arg(long, default_value_t = 2)]
    max_retries: u32,
    #[arg(long, default_value_t = 60)]
    timeout_seconds: u64,
    #[arg(long)]
    debug: bool,
}

impl CommonArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            max_retries: self.max_retries,
            timeout_seconds: self.timeout_seconds,
            intent: self.intent.clone(),
            debug: self.debug,
        }
    }
}

#[derive(Args, Debug)]
struct SingleArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Concurrent matrix cells
    #[arg(long, default_value_t = 4)]
    workers: usize,
    /// Write the full batch report as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct BatchReport {
    rows: Vec<BatchExperimentRow>,
    metrics: BTreeMap<String, MetricsSummary>,
    ranking: Vec<(String, f64)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Single(args) => run_single(args).await,
        Commands::Batch(args) => run_batch_command(args).await,
    }
}

async fn run_single(args: SingleArgs) -> Result<()> {
    let common = &args.common;
    let config = load_lab_config(&common.config)?;
    let settings = BackendSettings::from_env();
    let registry = Registry::from_settings(&settings);
    let prompts = PromptLibrary::new(&common.prompts);
    let snapshot = read_snapshot(&common.repo)?;

    let result = run_single_experiment(
        &registry,
        &prompts,
        &snapshot,
        &config.single,
        &common.options(),
    )
    .await;

    let logger = RunLogger::new(&common.log);
    logger.log_run(&result)?;

    print_result_line("single", &result);
    Ok(())
}

async fn run_batch_command(args: BatchArgs) -> Result<()> {
    let common = &args.common;
    let config = load_lab_config(&common.config)?;
    let settings = BackendSettings::from_env();
    let registry = Registry::from_settings(&settings);
    let prompts = PromptLibrary::new(&common.prompts);
    let snapshot = read_snapshot(&common.repo)?;
    let logger = RunLogger::new(&common.log);

    let rows = run_batch(
        &registry,
        &prompts,
        &snapshot,
        &config.batch,
        &common.options(),
        args.workers,
        Some(&logger),
    )
    .await?;

    for row in &rows {
        print_result_line(&row.config_id, &row.result);
    }

    let mut grouped: BTreeMap<String, Vec<EngineResult>> = BTreeMap::new();
    for row in &rows {
        grouped
            .entry(row.config_key())
            .or_default()
            .push(row.result.clone());
    }
    let metrics: BTreeMap<String, MetricsSummary> = grouped
        .into_iter()
        .map(|(key, results)| (key, compute_metrics(&results)))
        .collect();
    let ranking = compare_configs(&metrics);

    println!("\nRanking:");
    for (rank, (id, score)) in ranking.iter().enumerate() {
        println!("  {}. {:<50} {:>8.2}", rank + 1, id, score);
    }

    if let Some(path) = &args.output {
        let report = BatchReport {
            rows,
            metrics,
            ranking,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

fn print_result_line(id: &str, result: &EngineResult) {
    if result.is_valid() {
        let subject = result
            .commit
            .as_ref()
            .and_then(|commit| commit.subject.as_deref())
            .unwrap_or("");
        println!(
            "[{}] ok retries={} latency_ms={} subject={:?}",
            id, result.retries, result.latency_ms, subject
        );
    } else {
        println!(
            "[{}] FAIL error={} retries={} violations={}",
            id,
            result.error.as_deref().unwrap_or("unknown"),
            result.retries,
            result.violations.join(",")
        );
    }
}
