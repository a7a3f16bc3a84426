use anyhow::Result;
use clap::Parser;
use komet::config::{load_prod_config, BackendSettings};
use komet::engine;
use komet::git_ops::read_snapshot;
use komet::logger::{RunLogger, DEFAULT_RUN_LOG_PATH};
use komet::prompt::PromptLibrary;
use komet::providers::Registry;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "komet",
    about = "Generate a structured commit message from staged changes",
    version
)]
struct Args {
    /// Path to the repository (defaults to current directory)
    #[arg(default_value = ".")]
    repo: PathBuf,

    /// Production config file
    #[arg(short, long, default_value = "config/prod.toml")]
    config: PathBuf,

    /// Prompt template directory
    #[arg(long, default_value = "prompts")]
    prompts: PathBuf,

    /// Optional intent hint woven into the prompt
    #[arg(short, long)]
    intent: Option<String>,

    /// Run log destination (JSONL)
    #[arg(long, default_value = DEFAULT_RUN_LOG_PATH)]
    log: PathBuf,

    /// Emit structured debug events to stderr
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = load_prod_config(&args.config)?;
    let settings = BackendSettings::from_env();
    let registry = Registry::from_settings(&settings);
    let prompts = PromptLibrary::new(&args.prompts);

    let snapshot = read_snapshot(&args.repo)?;
    if snapshot.diff.is_empty() {
        eprintln!("Nothing staged. Stage changes first, then retry.");
        return Ok(ExitCode::FAILURE);
    }

    let result = engine::run_once(
        &registry,
        &prompts,
        &snapshot,
        &config,
        args.intent.as_deref(),
        args.debug,
    )
    .await;

    let logger = RunLogger::new(&args.log);
    if let Err(err) = logger.log_run(&result) {
        eprintln!("Warning: failed to write run log: {err:#}");
    }

    match &result.commit {
        Some(commit) if result.is_valid() => {
            let mut subject = commit.subject.clone().unwrap_or_default();
            if let Some(kind) = &commit.kind {
                subject = match &commit.scope {
                    Some(scope) => format!("{kind}({scope}): {subject}"),
                    None => format!("{kind}: {subject}"),
                };
            }
            println!("{subject}");
            if let Some(body) = commit.body.as_deref().filter(|body| !body.is_empty()) {
                println!("\n{body}");
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!(
                "Generation failed: {}",
                result.error.as_deref().unwrap_or("unknown")
            );
            if !result.violations.is_empty() {
                eprintln!("Violations: {}", result.violations.join(", "));
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
