//! Network collaborators: the localscore binary download and the model hub download.

mod artifact;
mod download;
mod hub;

use std::io::{self, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

pub use artifact::LocalscoreFetcher;
pub use hub::{pick_gguf, HubModelFetcher};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("No GGUF files found in repository {0}")]
    NoGguf(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Downloads the benchmarking executable and makes it runnable.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Returns the path of the installed executable.
    async fn fetch(&self) -> Result<PathBuf, FetchError>;
}

/// Downloads a model artifact from a hub repository.
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    /// Fetch `filename` from `repo_id`, choosing a GGUF file when no name is given.
    /// Progress messages go to `out`. Returns the on-disk path of the model.
    async fn fetch(
        &self,
        repo_id: &str,
        filename: Option<&str>,
        out: &mut (dyn Write + Send),
    ) -> Result<PathBuf, FetchError>;
}
