// tests/engine_concurrency.rs

mod common;
use crate::common::{
    Action, BatchBuilder, JobBuilder, ScriptedHandler, StageBuilder, run_batch, run_batch_with,
};

use std::collections::HashSet;
use std::time::{Duration, Instant};

use pipewright::engine::{JobOutcome, SummarySnapshot};
use pipewright::types::TaskKind;

fn three_stage_job(name: &str) -> JobBuilder {
    JobBuilder::new(name)
        .with_stage(StageBuilder::new("Checkout").enabled(TaskKind::SetupAndClone))
        .with_stage(
            StageBuilder::new("Build")
                .enabled(TaskKind::Maven)
                .enabled(TaskKind::Trivy),
        )
        .with_stage(StageBuilder::new("Notify").enabled(TaskKind::SendNotification))
}

#[tokio::test]
async fn readme_scenario_two_jobs_failing_at_clone() {
    let handler = ScriptedHandler::new().on(TaskKind::SetupAndClone, Action::Fail("clone failed".into()));
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(
            JobBuilder::new("job1")
                .with_stage(StageBuilder::new("Clone").enabled(TaskKind::SetupAndClone))
                .with_stage(StageBuilder::new("Build").enabled(TaskKind::Maven)),
        )
        .with_job(
            JobBuilder::new("job2").with_stage(
                StageBuilder::new("Clone")
                    .ignore_failure()
                    .enabled(TaskKind::SetupAndClone),
            ),
        )
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    let calls = calls.lock().unwrap();
    assert!(!calls.iter().any(|c| c.job == "job1" && c.kind == TaskKind::Maven));
    assert_eq!(calls.len(), 2);

    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.completed, 0);

    let job1 = report.job("job1").unwrap();
    assert!(job1.outcome.is_aborted());
    assert_eq!(job1.tally.failed, 1);

    let job2 = report.job("job2").unwrap();
    assert_eq!(job2.outcome, JobOutcome::Completed);
    assert_eq!(job2.tally.failed, 1);
}

#[tokio::test]
async fn jobs_failing_at_different_stages_do_not_affect_each_other() {
    let handler = ScriptedHandler::new()
        .on_in("a", "Checkout", TaskKind::SetupAndClone, Action::Fail("a broke".into()))
        .on_in("b", "Build", TaskKind::Trivy, Action::Fail("b broke".into()))
        .on(TaskKind::Maven, Action::Sleep(Duration::from_millis(20)));
    let calls = handler.calls();

    let batch = BatchBuilder::new()
        .with_job(three_stage_job("a"))
        .with_job(three_stage_job("b"))
        .with_job(three_stage_job("c"))
        .build();

    let (report, _root) = run_batch(handler.registry(), batch).await;

    let calls = calls.lock().unwrap();
    let count = |job: &str| calls.iter().filter(|c| c.job == job).count();
    assert_eq!(count("a"), 1);
    assert_eq!(count("b"), 3);
    assert_eq!(count("c"), 4);

    assert_eq!(
        report.job("a").unwrap().outcome,
        JobOutcome::AbortedByFailure { stage: "Checkout".into(), task: TaskKind::SetupAndClone }
    );
    assert_eq!(
        report.job("b").unwrap().outcome,
        JobOutcome::AbortedByFailure { stage: "Build".into(), task: TaskKind::Trivy }
    );
    assert_eq!(report.job("c").unwrap().outcome, JobOutcome::Completed);
    assert_eq!(
        report.summary,
        SummarySnapshot { completed: 6, failed: 2, uploaded: 0 }
    );
}

#[tokio::test]
async fn jobs_run_in_parallel_by_default() {
    let handler = ScriptedHandler::new().on(TaskKind::Sh, Action::Sleep(Duration::from_millis(300)));

    let mut builder = BatchBuilder::new();
    for i in 0..4 {
        builder = builder.with_job(
            JobBuilder::new(&format!("j{i}")).with_stage(StageBuilder::new("S").enabled(TaskKind::Sh)),
        );
    }

    let started = Instant::now();
    let (report, _root) = run_batch(handler.registry(), builder.build()).await;
    let elapsed = started.elapsed();

    assert_eq!(report.summary.completed, 4);
    assert!(elapsed < Duration::from_millis(1000), "took {elapsed:?}");
}

#[tokio::test]
async fn max_parallel_jobs_bounds_concurrency() {
    let handler = ScriptedHandler::new().on(TaskKind::Sh, Action::Sleep(Duration::from_millis(100)));

    let mut builder = BatchBuilder::new();
    for i in 0..3 {
        builder = builder.with_job(
            JobBuilder::new(&format!("j{i}")).with_stage(StageBuilder::new("S").enabled(TaskKind::Sh)),
        );
    }

    let started = Instant::now();
    let (report, _root) = run_batch_with(handler.registry(), builder.build(), Some(1)).await;

    assert_eq!(report.summary.completed, 3);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn every_job_gets_its_own_existing_workspace() {
    let handler = ScriptedHandler::new();

    let batch = BatchBuilder::new()
        .with_job(JobBuilder::new("same").with_stage(StageBuilder::new("S").enabled(TaskKind::Sh)))
        .with_job(JobBuilder::unnamed().with_stage(StageBuilder::new("S").enabled(TaskKind::Sh)))
        .with_job(JobBuilder::unnamed().with_stage(StageBuilder::new("S").enabled(TaskKind::Sh)))
        .build();

    let (report, root) = run_batch(handler.registry(), batch).await;

    let workspaces: HashSet<_> = report.jobs.iter().map(|j| j.workspace.clone()).collect();
    assert_eq!(workspaces.len(), 3);
    for ws in &workspaces {
        assert!(ws.starts_with(root.path()), "{}", ws.display());
        assert!(ws.is_dir(), "{}", ws.display());
    }

    let names: Vec<_> = report.jobs.iter().map(|j| j.id.display_name()).collect();
    assert_eq!(names, vec!["same", "job-2", "job-3"]);
}
