// src/engine/scheduler.rs

//! Batch scheduler: one worker per job, started together, joined together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::engine::{Batch, HandlerRegistry, JobId, JobRunner, RunReport, RunSummary};

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Upper bound on concurrently running jobs; one worker per job when
    /// `None`.
    pub max_parallel_jobs: Option<usize>,
    /// Parent directory of every per-job workspace.
    pub workspace_root: PathBuf,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_parallel_jobs: None,
            workspace_root: std::env::temp_dir().join("pipewright"),
        }
    }
}

#[derive(Debug)]
pub struct Scheduler {
    registry: Arc<HandlerRegistry>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(registry: HandlerRegistry, options: SchedulerOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            options,
        }
    }

    /// Run every job of the batch and wait for all of them.
    ///
    /// Never fails: job failures end up in the report, and a worker that
    /// dies is logged without affecting the other jobs.
    pub async fn run_batch(&self, batch: Batch) -> RunReport {
        let started = Instant::now();
        let summary = Arc::new(RunSummary::new());

        match &batch {
            Batch::Jobs(jobs) => info!(jobs = jobs.len(), "executing jobs in parallel"),
            Batch::Stages(stages) => info!(stages = stages.len(), "executing stages sequentially"),
        }

        let jobs = batch.into_jobs();
        let permits = Arc::new(Semaphore::new(permit_limit(
            self.options.max_parallel_jobs,
            jobs.len(),
        )));
        let nonce = batch_nonce();

        let mut workers = JoinSet::new();
        for job in jobs {
            let runner = JobRunner::new(Arc::clone(&self.registry), Arc::clone(&summary));
            let workspace = workspace_for(&self.options.workspace_root, &nonce, &job.id);
            let permits = Arc::clone(&permits);

            workers.spawn(async move {
                // The semaphore is never closed, so this only waits for a slot.
                let _permit = permits.acquire_owned().await.ok();
                runner.run(&job, workspace).await
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "job worker terminated abnormally"),
            }
        }
        reports.sort_by_key(|r| r.id.index);

        let report = RunReport {
            summary: summary.snapshot(),
            jobs: reports,
            failures: summary.failures(),
            elapsed: started.elapsed(),
        };

        info!(
            completed = report.summary.completed,
            failed = report.summary.failed,
            uploaded = report.summary.uploaded,
            "batch finished"
        );

        report
    }
}

/// Never more permits than jobs, and always at least one.
fn permit_limit(max_parallel_jobs: Option<usize>, jobs: usize) -> usize {
    let jobs = jobs.max(1);
    max_parallel_jobs.unwrap_or(jobs).clamp(1, jobs)
}

fn batch_nonce() -> Vec<u8> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut nonce = nanos.to_le_bytes().to_vec();
    nonce.extend_from_slice(&std::process::id().to_le_bytes());
    nonce
}

/// `<root>/<job-slug>-<8 hex>`; unique per job and per batch so that jobs
/// sharing a name or a default path never collide.
pub fn workspace_for(root: &Path, nonce: &[u8], job: &JobId) -> PathBuf {
    let name = job.display_name();

    let mut hasher = blake3::Hasher::new();
    hasher.update(nonce);
    hasher.update(&(job.index as u64).to_le_bytes());
    hasher.update(name.as_bytes());
    let digest = hasher.finalize().to_hex();

    root.join(format!("{}-{}", slug(&name), &digest.as_str()[..8]))
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "job".to_string()
    } else {
        slug.to_string()
    }
}
