// src/config/mod.rs

//! Pipeline file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML/YAML-backed data model (`model.rs`).
//! - Load a pipeline file from disk (`loader.rs`).
//! - Validate it and convert it into an engine `Batch` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, RawJob, RawStage, Settings, TaskConfig};
