#![allow(dead_code)]

use pipewright::config::TaskConfig;
use pipewright::engine::{Batch, JobId, JobSpec, StageSpec};
use pipewright::types::TaskKind;

/// Builder for a `Batch` of named jobs; indices follow insertion order.
pub struct BatchBuilder {
    jobs: Vec<JobBuilder>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn with_job(mut self, job: JobBuilder) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn build(self) -> Batch {
        Batch::Jobs(
            self.jobs
                .into_iter()
                .enumerate()
                .map(|(index, job)| job.build(index))
                .collect(),
        )
    }

    /// A bare stage list, run as one sequential job.
    pub fn stages(stages: Vec<StageSpec>) -> Batch {
        Batch::Stages(stages)
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one job.
pub struct JobBuilder {
    name: Option<String>,
    stages: Vec<StageSpec>,
}

impl JobBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            stages: Vec::new(),
        }
    }

    pub fn unnamed() -> Self {
        Self {
            name: None,
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: StageBuilder) -> Self {
        self.stages.push(stage.build());
        self
    }

    pub fn build(self, index: usize) -> JobSpec {
        JobSpec::new(JobId::new(index, self.name), self.stages)
    }
}

/// Builder for `StageSpec`.
pub struct StageBuilder {
    stage: StageSpec,
}

impl StageBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            stage: StageSpec::new(Some(name.to_string()), false),
        }
    }

    pub fn ignore_failure(mut self) -> Self {
        self.stage.ignore_failure = true;
        self
    }

    pub fn enabled(self, kind: TaskKind) -> Self {
        self.task(kind, TaskConfig::enabled())
    }

    pub fn disabled(self, kind: TaskKind) -> Self {
        self.task(kind, TaskConfig::disabled())
    }

    pub fn task(mut self, kind: TaskKind, config: TaskConfig) -> Self {
        self.stage = self.stage.with_task(kind, config);
        self
    }

    pub fn build(self) -> StageSpec {
        self.stage
    }
}
