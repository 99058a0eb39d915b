use anyhow::{Context, Result};
use etcetera::{choose_app_strategy, AppStrategy, AppStrategyArgs};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const LOG_FILTER_ENV: &str = "LLM_BENCH_LOG";
const DEFAULT_FILTER: &str = "llm_bench=debug,llm_bench_cli=debug";

/// Directory holding the rolling log files, e.g. `~/.local/state/llm-bench/logs` on Linux.
pub fn log_dir() -> Result<PathBuf> {
    let strategy = choose_app_strategy(AppStrategyArgs {
        top_level_domain: "dev".to_string(),
        author: "llm-bench".to_string(),
        app_name: "llm-bench".to_string(),
    })
    .context("could not determine a home directory for logs")?;
    let base = strategy.state_dir().unwrap_or_else(|| strategy.data_dir());
    Ok(base.join("logs"))
}

/// Send JSON logs to a daily rolling file. Stdout is left to the benchmark output.
pub fn setup_logging() -> Result<()> {
    let dir = log_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("llm-bench")
        .filename_suffix("log")
        .build(&dir)
        .context("failed to open log file")?;

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = fmt::layer()
        .json()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    Registry::default()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
