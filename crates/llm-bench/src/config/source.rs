use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
    #[error("Failed to determine the working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
}

/// Looks up string settings in the process environment, then in an optional `.env` file.
///
/// The file is read once and never exported into the environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigSource {
    file_values: HashMap<String, String>,
}

impl ConfigSource {
    /// Load `<dir>/.env` if it exists.
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let env_file = dir.join(".env");
        if !env_file.is_file() {
            return Ok(Self::default());
        }

        let to_error = |source| ConfigError::EnvFile {
            path: env_file.display().to_string(),
            source,
        };
        let mut file_values = HashMap::new();
        for item in dotenvy::from_path_iter(&env_file).map_err(to_error)? {
            let (key, value) = item.map_err(to_error)?;
            file_values.insert(key, value);
        }
        tracing::debug!(path = %env_file.display(), keys = file_values.len(), "loaded .env overrides");

        Ok(Self { file_values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.get_from_env(key)
            .or_else(|| self.file_values.get(key).cloned())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn get_from_env(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
