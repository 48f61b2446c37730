// src/engine/state.rs

//! Per-job mutable state threaded through every handler call.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::engine::{JobId, TaskOutcome};
use crate::errors::{PipewrightError, Result};

/// Running count of this job's task outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// State owned by exactly one job runner for the lifetime of the job.
///
/// Handlers receive it by `&mut` and run strictly one at a time, so writes by
/// an earlier task (e.g. the clone directory) are visible to every later task
/// of the same job.
#[derive(Debug)]
pub struct JobState {
    job: JobId,
    workspace: PathBuf,
    working_dir: Option<PathBuf>,
    built_image: Option<String>,
    tally: TaskTally,
}

impl JobState {
    pub fn new(job: JobId, workspace: PathBuf) -> Self {
        Self {
            job,
            workspace,
            working_dir: None,
            built_image: None,
            tally: TaskTally::default(),
        }
    }

    pub fn job(&self) -> &JobId {
        &self.job
    }

    /// Scratch directory unique to this job.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Working directory established by the clone task.
    ///
    /// Fails with a descriptive error when no clone task has run yet.
    pub fn require_working_dir(&self) -> Result<&Path> {
        self.working_dir
            .as_deref()
            .ok_or_else(|| PipewrightError::MissingWorkingDir(self.job.display_name()))
    }

    /// Set the working directory. Expected once per job; a second call wins
    /// but is logged.
    pub fn set_working_dir(&mut self, dir: PathBuf) {
        if let Some(prev) = &self.working_dir {
            warn!(
                job = %self.job,
                previous = %prev.display(),
                new = %dir.display(),
                "working directory set more than once for this job"
            );
        }
        self.working_dir = Some(dir);
    }

    /// Image reference (`name:tag`) produced by the last container build.
    pub fn built_image(&self) -> Option<&str> {
        self.built_image.as_deref()
    }

    pub fn set_built_image(&mut self, image: String) {
        self.built_image = Some(image);
    }

    pub fn tally(&self) -> TaskTally {
        self.tally
    }

    /// True once any task of this job has failed (even an ignored failure).
    pub fn has_failures(&self) -> bool {
        self.tally.failed > 0
    }

    pub(crate) fn note_outcome(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Success => self.tally.succeeded += 1,
            TaskOutcome::Failure(_) => self.tally.failed += 1,
            TaskOutcome::Skipped(_) => self.tally.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_working_dir_before_clone_is_a_descriptive_error() {
        let state = JobState::new(JobId::new(2, None), PathBuf::from("/tmp/ws"));
        let err = state.require_working_dir().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("job-3"), "{msg}");
        assert!(msg.contains("setup_and_clone"), "{msg}");
    }

    #[test]
    fn working_dir_is_visible_after_set() {
        let mut state = JobState::new(JobId::new(0, Some("web".into())), PathBuf::from("/tmp/ws"));
        state.set_working_dir(PathBuf::from("/tmp/ws/repo"));
        assert_eq!(state.require_working_dir().unwrap(), Path::new("/tmp/ws/repo"));
    }

    #[test]
    fn tally_tracks_outcomes() {
        let mut state = JobState::new(JobId::new(0, None), PathBuf::from("/tmp/ws"));
        state.note_outcome(&TaskOutcome::Success);
        state.note_outcome(&TaskOutcome::skipped("nothing to do"));
        assert!(!state.has_failures());
        state.note_outcome(&TaskOutcome::failure("exit 1"));
        assert!(state.has_failures());
        assert_eq!(
            state.tally(),
            TaskTally { succeeded: 1, failed: 1, skipped: 1 }
        );
    }
}
