//! Ties the fetchers, locator, resolver and runner together for one invocation.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{Settings, LOCALSCORE_BIN};
use crate::errors::BenchResult;
use crate::fetch::{ArtifactFetcher, ModelFetcher};
use crate::locator::SearchDirectories;
use crate::resolver::{resolve_model_path, ModelNotFound};
use crate::runner::{self, Invocation};

/// What the user asked for on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchRequest {
    pub model_path: Option<PathBuf>,
    pub download_localscore: bool,
    pub force: bool,
    pub download_model: bool,
    /// Overrides the configured repository for `download_model`.
    pub repo_id: Option<String>,
    pub filename: Option<String>,
}

/// How a run ended when no unexpected fault occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No model path was supplied or fetched; the caller should print usage.
    Usage,
    /// The benchmark ran and exited with this code.
    Exited(i32),
    ExecutableNotFound,
    ModelNotFound(ModelNotFound),
    ModelFetchFailed,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Usage => 0,
            RunOutcome::Exited(code) => *code,
            RunOutcome::ExecutableNotFound
            | RunOutcome::ModelNotFound(_)
            | RunOutcome::ModelFetchFailed => 1,
        }
    }
}

pub struct Orchestrator<'a> {
    settings: &'a Settings,
    search: SearchDirectories,
    artifacts: &'a dyn ArtifactFetcher,
    models: &'a dyn ModelFetcher,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        settings: &'a Settings,
        search: SearchDirectories,
        artifacts: &'a dyn ArtifactFetcher,
        models: &'a dyn ModelFetcher,
    ) -> Self {
        Self {
            settings,
            search,
            artifacts,
            models,
        }
    }

    /// Run the full flow, writing user-facing messages and benchmark output to `out`.
    pub async fn run<W: Write + Send>(
        &self,
        request: BenchRequest,
        out: &mut W,
    ) -> BenchResult<RunOutcome> {
        if request.download_localscore {
            self.ensure_localscore(request.force, out).await?;
        }

        let mut model_path = request.model_path;
        if request.download_model {
            let repo_id = request
                .repo_id
                .as_deref()
                .unwrap_or(self.settings.hf_repo_id.as_str());
            match self
                .models
                .fetch(repo_id, request.filename.as_deref(), out)
                .await {
                Ok(path) => {
                    if model_path.is_none() {
                        model_path = Some(path);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, repo_id, "model download failed");
                    writeln!(out, "Error downloading model: {}", e)?;
                    writeln!(out, "Failed to download model.")?;
                    return Ok(RunOutcome::ModelFetchFailed);
                }
            }
        }

        match model_path {
            Some(path) => self.benchmark(&path, out).await,
            None => Ok(RunOutcome::Usage),
        }
    }

    async fn ensure_localscore<W: Write>(&self, force: bool, out: &mut W) -> BenchResult<()> {
        if !force && self.search.find(LOCALSCORE_BIN).is_some() {
            writeln!(
                out,
                "localscore is already available. Use --force to download anyway."
            )?;
            return Ok(());
        }

        writeln!(
            out,
            "Downloading localscore {}...",
            self.settings.localscore_version
        )?;
        out.flush()?;
        let installed = self.artifacts.fetch().await?;
        writeln!(out, "Downloaded and made executable: {}", installed.display())?;
        Ok(())
    }

    async fn benchmark<W: Write>(&self, model_path: &Path, out: &mut W) -> BenchResult<RunOutcome> {
        let Some(executable) = self.search.find(LOCALSCORE_BIN) else {
            writeln!(
                out,
                "Error: localscore not found in PATH or current directory. Run with --download-localscore first."
            )?;
            return Ok(RunOutcome::ExecutableNotFound);
        };

        let resolved = match resolve_model_path(
            model_path,
            &self.settings.model_dir,
            self.search.working_dir(),
        ) {
            Ok(resolved) => resolved,
            Err(not_found) => {
                writeln!(out, "{}", not_found)?;
                return Ok(RunOutcome::ModelNotFound(not_found));
            }
        };

        let invocation = Invocation::new(&executable, &resolved.path);
        let code = runner::run(&invocation, out).await?;
        Ok(RunOutcome::Exited(code))
    }
}
