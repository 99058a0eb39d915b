mod base;
mod source;

pub use base::{
    Settings, DEFAULT_HF_ENDPOINT, DEFAULT_HF_REPO_ID, DEFAULT_LOCALSCORE_VERSION, LOCALSCORE_BIN,
};
pub use source::{ConfigError, ConfigSource};
