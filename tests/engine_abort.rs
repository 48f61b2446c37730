// tests/engine_abort.rs

mod common;
use crate::common::{
    Action, BatchBuilder, Invocation, JobBuilder, ScriptedHandler, StageBuilder, run_batch,
};

use std::time::Duration;

use pipewright::config::TaskConfig;
use pipewright::engine::{JobOutcome, SummarySnapshot};
use pipewright::types::TaskKind;

#[tokio::test]
async fn failure_without_ignore_stops_the_rest_of_the_job() {
    let handler = ScriptedHandler::new().on(TaskKind::Maven, Action::Fail("compile error".into()));
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("api")
                .with_stage(
                    StageBuilder::new("Build")
                        .enabled(TaskKind::SetupAndClone)
                        .enabled(TaskKind::Maven)
                        .enabled(TaskKind::Trivy),
                )
                .with_stage(StageBuilder::new("Notify").enabled(TaskKind::SendNotification)),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            Invocation::new("api", "Build", TaskKind::SetupAndClone),
            Invocation::new("api", "Build", TaskKind::Maven),
        ]
    );
    assert_eq!(
        report.summary,
        SummarySnapshot { completed: 1, failed: 1, uploaded: 0 }
    );

    let job = report.job("api").unwrap();
    assert_eq!(
        job.outcome,
        JobOutcome::AbortedByFailure { stage: "Build".into(), task: TaskKind::Maven }
    );
    assert_eq!((job.stages_run, job.stages_total), (1, 2));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].message, "compile error");
    assert!(!report.is_success());
}

#[tokio::test]
async fn ignore_failure_moves_on_to_the_next_kind() {
    let handler = ScriptedHandler::new().on(TaskKind::Sh, Action::Fail("exit 1".into()));
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("web")
                .with_stage(
                    StageBuilder::new("Checks")
                        .ignore_failure()
                        .enabled(TaskKind::Sh)
                        .enabled(TaskKind::Npm),
                )
                .with_stage(StageBuilder::new("Scan").enabled(TaskKind::Trivy)),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    let kinds: Vec<_> = calls.lock().unwrap().iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![TaskKind::Sh, TaskKind::Npm, TaskKind::Trivy]);
    assert_eq!(report.summary.completed, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.job("web").unwrap().outcome, JobOutcome::Completed);
}

#[tokio::test]
async fn tasks_run_in_canonical_order_regardless_of_declaration() {
    let handler = ScriptedHandler::new();
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("ordered").with_stage(
                StageBuilder::new("All")
                    .enabled(TaskKind::RequestApproval)
                    .enabled(TaskKind::Trivy)
                    .enabled(TaskKind::Ant)
                    .enabled(TaskKind::DockerBuild)
                    .enabled(TaskKind::SetupAndClone),
            ),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    let kinds: Vec<_> = calls.lock().unwrap().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TaskKind::SetupAndClone,
            TaskKind::DockerBuild,
            TaskKind::Ant,
            TaskKind::Trivy,
            TaskKind::RequestApproval,
        ]
    );
    assert_eq!(report.summary.completed, 5);
}

#[tokio::test]
async fn all_disabled_job_invokes_nothing_and_counts_nothing() {
    let handler = ScriptedHandler::new();
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("idle")
                .with_stage(
                    StageBuilder::new("One")
                        .disabled(TaskKind::SetupAndClone)
                        .disabled(TaskKind::Maven),
                )
                .with_stage(StageBuilder::new("Two").disabled(TaskKind::SendNotification)),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(report.summary, SummarySnapshot::default());
    let job = report.job("idle").unwrap();
    assert_eq!(job.outcome, JobOutcome::Completed);
    assert_eq!(job.stages_run, 2);
    assert!(report.is_success());
}

#[tokio::test]
async fn skipped_outcomes_are_neither_completed_nor_failed() {
    let handler = ScriptedHandler::new().on(TaskKind::Bash, Action::Skip("no steps".into()));

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("j").with_stage(
                StageBuilder::new("S")
                    .enabled(TaskKind::Bash)
                    .enabled(TaskKind::Yarn),
            ),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    assert_eq!(report.summary, SummarySnapshot { completed: 1, failed: 0, uploaded: 0 });
    assert_eq!(report.job("j").unwrap().tally.skipped, 1);
}

#[tokio::test]
async fn handler_errors_panics_and_timeouts_become_failures() {
    let handler = ScriptedHandler::new()
        .on(TaskKind::Sh, Action::Error("settings exploded".into()))
        .on(TaskKind::Bash, Action::Panic("boom".into()))
        .on(TaskKind::Maven, Action::Sleep(Duration::from_secs(30)));
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("unlucky").with_stage(
                StageBuilder::new("Everything")
                    .ignore_failure()
                    .enabled(TaskKind::Sh)
                    .enabled(TaskKind::Bash)
                    .task(TaskKind::Maven, TaskConfig::enabled().with_timeout("50ms"))
                    .enabled(TaskKind::Npm),
            ),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    assert_eq!(calls.lock().unwrap().len(), 4);
    assert_eq!(report.summary.failed, 3);
    assert_eq!(report.summary.completed, 1);

    let messages: Vec<_> = report.failures.iter().map(|f| f.message.as_str()).collect();
    assert!(messages[0].contains("settings exploded"), "{messages:?}");
    assert_eq!(messages[1], "handler panicked: boom");
    assert!(messages[2].starts_with("timed out after"), "{messages:?}");
}

#[tokio::test]
async fn a_panicking_handler_still_aborts_like_any_failure() {
    let handler = ScriptedHandler::new().on(TaskKind::SetupAndClone, Action::Panic("oops".into()));
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("p")
                .with_stage(StageBuilder::new("Checkout").enabled(TaskKind::SetupAndClone))
                .with_stage(StageBuilder::new("Build").enabled(TaskKind::Gradle)),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(report.job("p").unwrap().outcome.is_aborted());
}

#[tokio::test]
async fn flat_stage_list_runs_as_one_job_with_the_same_abort_rules() {
    let handler = ScriptedHandler::new().on(TaskKind::DockerBuild, Action::Fail("no Dockerfile".into()));
    let calls = handler.calls();

    let batch = BatchBuilder::stages(vec![
        StageBuilder::new("Checkout").enabled(TaskKind::SetupAndClone).build(),
        StageBuilder::new("Image")
            .enabled(TaskKind::DockerBuild)
            .enabled(TaskKind::DockerHub)
            .build(),
        StageBuilder::new("Notify").enabled(TaskKind::SendNotification).build(),
    ]);

    let (report, _root) = run_batch(handler.registry(), batch).await;

    let kinds: Vec<_> = calls.lock().unwrap().iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![TaskKind::SetupAndClone, TaskKind::DockerBuild]);
    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].id.display_name(), "job-1");
    assert_eq!(
        report.jobs[0].outcome,
        JobOutcome::AbortedByFailure { stage: "Image".into(), task: TaskKind::DockerBuild }
    );
}

#[tokio::test]
async fn kinds_without_a_registered_handler_are_skipped_silently() {
    let handler = ScriptedHandler::new();
    let calls = handler.calls();
    let registry = pipewright::engine::HandlerRegistry::new().with(
        TaskKind::Sh,
        std::sync::Arc::new(handler.clone()),
    );

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("partial").with_stage(
                StageBuilder::new("S")
                    .enabled(TaskKind::Maven)
                    .enabled(TaskKind::Sh),
            ),
        )
        .build();

    let (report, _root) = run_batch(registry, batch).await;

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(report.summary, SummarySnapshot { completed: 1, failed: 0, uploaded: 0 });
}
