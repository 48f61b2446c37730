#![allow(dead_code)]

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};

use pipewright::engine::{Batch, HandlerRegistry, RunReport, Scheduler, SchedulerOptions};

pub use pipewright_test_utils::builders::{BatchBuilder, JobBuilder, StageBuilder};
pub use pipewright_test_utils::fake_handler::{Action, Invocation, ScriptedHandler};
pub use pipewright_test_utils::fake_runner::RecordingProcessRunner;
pub use pipewright_test_utils::{init_tracing, with_timeout};

/// Run `batch` against `registry` with workspaces under a fresh temp dir.
///
/// The temp dir is returned so it outlives the assertions.
pub async fn run_batch(registry: HandlerRegistry, batch: Batch) -> (RunReport, TempDir) {
    run_batch_with(registry, batch, None).await
}

pub async fn run_batch_with(
    registry: HandlerRegistry,
    batch: Batch,
    max_parallel_jobs: Option<usize>,
) -> (RunReport, TempDir) {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    let scheduler = Scheduler::new(
        registry,
        SchedulerOptions {
            max_parallel_jobs,
            workspace_root: root.path().to_path_buf(),
        },
    );
    let report = with_timeout(scheduler.run_batch(batch)).await;
    (report, root)
}

/// Write `contents` to a temp file with the given extension.
pub fn config_file(contents: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .unwrap();
    write!(file, "{contents}").unwrap();
    file
}
