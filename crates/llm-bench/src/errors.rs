use std::io;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::runner::RunError;

/// Faults that abort a run. Expected absences (missing executable, missing model)
/// are reported through [`crate::orchestrator::RunOutcome`] instead.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;
