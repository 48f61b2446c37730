// src/config/validate.rs

use std::collections::HashSet;

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile, RawStage};
use crate::engine::{Batch, JobId, JobSpec, StageSpec};
use crate::errors::{PipewrightError, Result};
use crate::types::{parse_duration, TaskKind};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipewrightError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_global_config(&raw)?;

        let batch = match (raw.jobs, raw.stages) {
            (Some(_), Some(_)) => {
                return Err(PipewrightError::ConfigError(
                    "config must contain either `jobs` or `stages`, not both".to_string(),
                ));
            }
            (Some(jobs), None) => {
                if jobs.is_empty() {
                    return Err(PipewrightError::ConfigError(
                        "`jobs` must contain at least one job".to_string(),
                    ));
                }
                ensure_unique_job_names(&jobs)?;
                let jobs = jobs
                    .into_iter()
                    .enumerate()
                    .map(|(index, job)| {
                        let id = JobId::new(index, job.name);
                        let stages = convert_stages(&id.display_name(), job.stages)?;
                        Ok(JobSpec::new(id, stages))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Batch::Jobs(jobs)
            }
            (None, Some(stages)) => {
                if stages.is_empty() {
                    return Err(PipewrightError::ConfigError(
                        "`stages` must contain at least one stage".to_string(),
                    ));
                }
                Batch::Stages(convert_stages("pipeline", stages)?)
            }
            (None, None) => {
                return Err(PipewrightError::ConfigError(
                    "config must contain a `jobs` or a `stages` list".to_string(),
                ));
            }
        };

        Ok(ConfigFile::new_unchecked(raw.config, batch))
    }
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.max_parallel_jobs == Some(0) {
        return Err(PipewrightError::ConfigError(
            "[config].max_parallel_jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Job names must be unique after unnamed jobs receive their `job-<n>`
/// display names.
fn ensure_unique_job_names(jobs: &[crate::config::model::RawJob]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, job) in jobs.iter().enumerate() {
        let name = JobId::new(index, job.name.clone()).display_name();
        if !seen.insert(name.clone()) {
            let hint = if jobs.iter().take(index + 1).any(|j| j.name.is_none()) {
                " (unnamed jobs are called `job-<n>`)"
            } else {
                ""
            };
            return Err(PipewrightError::ConfigError(format!(
                "duplicate job name '{name}'{hint}"
            )));
        }
    }
    Ok(())
}

fn convert_stages(job: &str, stages: Vec<RawStage>) -> Result<Vec<StageSpec>> {
    stages
        .into_iter()
        .map(|raw| {
            let mut stage = StageSpec::new(raw.name, raw.ignore_failure);
            for (key, task) in raw.tasks {
                let kind = match key.parse::<TaskKind>() {
                    Ok(kind) => kind,
                    Err(_) => {
                        warn!(
                            job,
                            stage = %stage.name,
                            task = %key,
                            "unknown task kind in config; it will never run"
                        );
                        continue;
                    }
                };

                if let Some(timeout) = task.timeout.as_deref() {
                    parse_duration(timeout).map_err(|e| {
                        PipewrightError::ConfigError(format!(
                            "job '{}', stage '{}', task '{}': invalid timeout: {}",
                            job, stage.name, kind, e
                        ))
                    })?;
                }

                stage = stage.with_task(kind, task);
            }
            Ok(stage)
        })
        .collect()
}
