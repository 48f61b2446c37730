// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a pipeline file from a given path and return the raw `RawConfigFile`.
///
/// Files ending in `.yaml` / `.yml` are read as YAML, everything else as
/// TOML. This only performs deserialization; use [`load_and_validate`] for
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = if is_yaml(path) {
        serde_yaml::from_str(&contents)?
    } else {
        toml::from_str(&contents)?
    };

    Ok(config)
}

/// Load a pipeline file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML or YAML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - exactly one of `jobs` / `stages`,
///   - duplicate job names,
///   - invalid task timeouts,
///   - basic global config sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Pipeline.toml")
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
