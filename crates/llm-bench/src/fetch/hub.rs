use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::fs;

use super::download::download_to;
use super::{FetchError, ModelFetcher};
use crate::config::Settings;

const REVISION: &str = "main";

/// Entry of the hub `tree` listing.
#[derive(Debug, Deserialize)]
struct HubFile {
    path: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Fetches GGUF files from a Hugging Face compatible hub into the model directory.
pub struct HubModelFetcher {
    client: Client,
    endpoint: String,
    token: Option<String>,
    model_dir: PathBuf,
}

impl HubModelFetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(settings.user_agent()).build()?;
        Ok(Self {
            client,
            endpoint: settings.hf_endpoint.clone(),
            token: settings.hf_token.clone(),
            model_dir: settings.model_dir.clone(),
        })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn list_files(&self, repo_id: &str) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}/api/models/{}/tree/{}?recursive=true",
            self.endpoint, repo_id, REVISION
        );
        let response = self.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let files: Vec<HubFile> = response.json().await?;
        Ok(files
            .into_iter()
            .filter(|f| f.kind.as_deref() != Some("directory"))
            .map(|f| f.path)
            .collect())
    }

    pub fn file_url(&self, repo_id: &str, filename: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, repo_id, REVISION, filename
        )
    }
}

#[async_trait]
impl ModelFetcher for HubModelFetcher {
    async fn fetch(
        &self,
        repo_id: &str,
        filename: Option<&str>,
        out: &mut (dyn Write + Send),
    ) -> Result<PathBuf, FetchError> {
        fs::create_dir_all(&self.model_dir).await?;
        writeln!(out, "Downloading model from {}...", repo_id)?;

        let filename = match filename {
            Some(name) => name.to_string(),
            None => {
                let files = self.list_files(repo_id).await?;
                let chosen = pick_gguf(&files)
                    .ok_or_else(|| FetchError::NoGguf(repo_id.to_string()))?
                    .to_string();
                writeln!(out, "Found GGUF file: {}", chosen)?;
                chosen
            }
        };

        let url = self.file_url(repo_id, &filename);
        writeln!(out, "Downloading from: {}", url)?;
        out.flush()?;

        let dest = self.model_dir.join(&filename);
        if fs::metadata(&dest).await.is_ok_and(|m| m.is_file()) {
            tracing::info!(path = %dest.display(), "model already present, skipping download");
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).await?;
            }
            let partial = incomplete_path(&dest);
            download_to(self.get(&url), &partial, &filename).await?;
            fs::rename(&partial, &dest).await?;
        }

        let dest = fs::canonicalize(&dest).await?;
        writeln!(out, "Model downloaded to: {}", dest.display())?;
        Ok(dest)
    }
}

fn incomplete_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".incomplete");
    dest.with_file_name(name)
}

/// Choose a GGUF file, preferring a q4 quantization.
pub fn pick_gguf(files: &[String]) -> Option<&str> {
    let mut ggufs = files.iter().filter(|f| f.ends_with(".gguf"));
    let first = ggufs.clone().next()?;
    Some(
        ggufs
            .find(|f| f.to_lowercase().contains("q4"))
            .unwrap_or(first)
            .as_str(),
    )
}
