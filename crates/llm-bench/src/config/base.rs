use std::env;
use std::path::{Path, PathBuf};

use super::source::{ConfigError, ConfigSource};
use crate::paths::{expand_home, resolve_lenient};

/// Name of the benchmarking executable on disk.
pub const LOCALSCORE_BIN: &str = "localscore";
pub const DEFAULT_LOCALSCORE_VERSION: &str = "0.9.3";
pub const DEFAULT_HF_REPO_ID: &str = "TheBloke/Llama-2-7B-Chat-GGUF";
pub const DEFAULT_HF_ENDPOINT: &str = "https://huggingface.co";

const LOCALSCORE_BLOB_URL: &str = "https://blob.localscore.ai";

/// Settings read once at startup and passed by reference to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub localscore_version: String,
    pub localscore_url: String,
    pub hf_hub_disable_telemetry: bool,
    pub hf_repo_id: String,
    pub hf_endpoint: String,
    pub hf_token: Option<String>,
    pub model_dir: PathBuf,
}

impl Settings {
    /// Load settings relative to the current working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let cwd = env::current_dir()?;
        Self::load_from(&cwd)
    }

    /// Load settings using `cwd` for the `.env` lookup and the default model directory.
    pub fn load_from(cwd: &Path) -> Result<Self, ConfigError> {
        let source = ConfigSource::from_dir(cwd)?;
        Ok(Self::from_source(&source, cwd))
    }

    pub fn from_source(source: &ConfigSource, cwd: &Path) -> Self {
        let localscore_version = source.get_or("LOCALSCORE_VERSION", DEFAULT_LOCALSCORE_VERSION);
        let localscore_url = format!("{}/localscore-{}", LOCALSCORE_BLOB_URL, localscore_version);

        let model_dir = match source.get("MODEL_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => cwd.join("models"),
        };
        let model_dir = resolve_lenient(&expand_home(&model_dir), cwd);

        Settings {
            localscore_version,
            localscore_url,
            hf_hub_disable_telemetry: is_truthy(&source.get_or("HF_HUB_DISABLE_TELEMETRY", "1")),
            hf_repo_id: source.get_or("HF_REPO_ID", DEFAULT_HF_REPO_ID),
            hf_endpoint: source
                .get_or("HF_ENDPOINT", DEFAULT_HF_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            hf_token: source.get("HF_TOKEN").filter(|t| !t.is_empty()),
            model_dir,
        }
    }

    /// File name the artifact is first written under before being renamed to [`LOCALSCORE_BIN`].
    pub fn versioned_binary_name(&self) -> String {
        format!("{}-{}", LOCALSCORE_BIN, self.localscore_version)
    }

    /// User agent for hub and blob requests. Only carries client details when telemetry is on.
    pub fn user_agent(&self) -> String {
        let name = env!("CARGO_PKG_NAME");
        if self.hf_hub_disable_telemetry {
            name.to_string()
        } else {
            format!(
                "{}/{}; os/{}; arch/{}",
                name,
                env!("CARGO_PKG_VERSION"),
                env::consts::OS,
                env::consts::ARCH
            )
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
