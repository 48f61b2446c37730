// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipewrightError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A task needed the job's working directory before any clone task set it.
    #[error("no working directory for job '{0}': enable a setup_and_clone task in an earlier stage")]
    MissingWorkingDir(String),

    #[error("invalid task setting `{key}`: {message}")]
    InvalidTaskSetting { key: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipewrightError {
    pub fn invalid_setting(key: impl Into<String>, message: impl Into<String>) -> Self {
        PipewrightError::InvalidTaskSetting {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipewrightError>;
