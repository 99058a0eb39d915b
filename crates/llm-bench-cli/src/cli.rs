use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::future::Future;
use std::path::PathBuf;

use llm_bench::config::Settings;
use llm_bench::fetch::{HubModelFetcher, LocalscoreFetcher};
use llm_bench::locator::SearchDirectories;
use llm_bench::orchestrator::{BenchRequest, Orchestrator, RunOutcome};

use crate::logging::setup_logging;
use crate::signal::shutdown_signal;

#[derive(Parser, Debug)]
#[command(
    name = "llm-bench",
    version,
    about = "Benchmark GGUF models with localscore",
    after_help = "After downloading, copy or symlink this tool to a location in your PATH \
                  (e.g., ~/.local/bin/llm-bench) for easier access."
)]
struct Cli {
    /// Path to the GGUF model file to benchmark
    #[arg(value_name = "MODEL_PATH")]
    model_path: Option<PathBuf>,

    #[arg(long = "download-localscore", help = "Download the localscore binary")]
    download_localscore: bool,

    #[arg(long = "download-model", help = "Download a model from HuggingFace")]
    download_model: bool,

    #[arg(
        short = 'f',
        long = "force",
        help = "Force download even if localscore is already in PATH"
    )]
    force: bool,

    #[arg(
        long = "repo",
        value_name = "REPO_ID",
        requires = "download_model",
        help = "Repository to download from (defaults to HF_REPO_ID)"
    )]
    repo: Option<String>,

    #[arg(
        long = "filename",
        value_name = "FILE",
        requires = "download_model",
        help = "File to download from the repository (defaults to the first q4 GGUF)"
    )]
    filename: Option<String>,
}

impl From<Cli> for BenchRequest {
    fn from(cli: Cli) -> Self {
        BenchRequest {
            model_path: cli.model_path,
            download_localscore: cli.download_localscore,
            force: cli.force,
            download_model: cli.download_model,
            repo_id: cli.repo,
            filename: cli.filename,
        }
    }
}

/// Parse arguments, run, and return the process exit code.
pub async fn cli() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = setup_logging() {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    run_until(run(cli), shutdown_signal()).await
}

/// Drive `work` to an exit code unless `interrupt` resolves first.
///
/// On interrupt `work` is dropped, which kills a benchmark that is still running.
async fn run_until<F, I>(work: F, interrupt: I) -> i32
where
    F: Future<Output = Result<i32>>,
    I: Future<Output = ()>,
{
    tokio::select! {
        result = work => match result {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "run failed");
                println!("Error: {:#}", e);
                1
            }
        },
        _ = interrupt => {
            tracing::info!("interrupted");
            println!("\nBye!");
            0
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let settings = Settings::load().context("failed to load configuration")?;
    tracing::debug!(?settings.model_dir, version = %settings.localscore_version, "settings loaded");

    let search = SearchDirectories::from_env().context("failed to read the working directory")?;
    let artifacts = LocalscoreFetcher::new(&settings, search.working_dir().to_path_buf())?;
    let models = HubModelFetcher::new(&settings)?;
    let orchestrator = Orchestrator::new(&settings, search, &artifacts, &models);

    let mut stdout = std::io::stdout();
    let outcome = orchestrator.run(BenchRequest::from(cli), &mut stdout).await?;

    if outcome == RunOutcome::Usage {
        Cli::command().print_help()?;
        println!();
    }
    Ok(outcome.exit_code())
}
