use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs;

use super::download::download_to;
use super::{ArtifactFetcher, FetchError};
use crate::config::{Settings, LOCALSCORE_BIN};

/// Downloads the versioned localscore build into a directory as `localscore`.
pub struct LocalscoreFetcher {
    client: Client,
    url: String,
    versioned_name: String,
    dest_dir: PathBuf,
}

impl LocalscoreFetcher {
    pub fn new(settings: &Settings, dest_dir: PathBuf) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(settings.user_agent()).build()?;
        Ok(Self {
            client,
            url: settings.localscore_url.clone(),
            versioned_name: settings.versioned_binary_name(),
            dest_dir,
        })
    }
}

#[async_trait]
impl ArtifactFetcher for LocalscoreFetcher {
    async fn fetch(&self) -> Result<PathBuf, FetchError> {
        tracing::info!(url = %self.url, "downloading localscore");
        let staged = self.dest_dir.join(&self.versioned_name);
        download_to(self.client.get(&self.url), &staged, &self.versioned_name).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = fs::metadata(&staged).await?.permissions();
            permissions.set_mode(permissions.mode() | 0o111);
            fs::set_permissions(&staged, permissions).await?;
        }

        let installed = self.dest_dir.join(LOCALSCORE_BIN);
        if fs::symlink_metadata(&installed).await.is_ok() {
            fs::remove_file(&installed).await?;
        }
        fs::rename(&staged, &installed).await?;
        tracing::info!(path = %installed.display(), "localscore installed");
        Ok(installed)
    }
}
