// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::{Batch, RunReport, Scheduler, SchedulerOptions, StageSpec};
use crate::exec::{ShellProcessRunner, default_registry};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the production handler registry
/// - the batch scheduler
///
/// Returns `None` for `--dry-run`, otherwise the report of the finished batch.
/// Task failures are part of the report, not an `Err`.
pub async fn run(args: CliArgs) -> Result<Option<RunReport>> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let options = scheduler_options(&args, &cfg);

    if args.dry_run {
        print_dry_run(&cfg, &options);
        return Ok(None);
    }

    info!(
        config = %config_path.display(),
        jobs = cfg.batch.job_count(),
        max_parallel_jobs = ?options.max_parallel_jobs,
        workspace_root = %options.workspace_root.display(),
        "starting pipeline"
    );

    let registry = default_registry(Arc::new(ShellProcessRunner), args.approval_policy());
    let scheduler = Scheduler::new(registry, options);
    let report = scheduler.run_batch(cfg.into_batch()).await;

    print!("{report}");
    Ok(Some(report))
}

/// `[config]` values, with CLI flags taking precedence.
pub fn scheduler_options(args: &CliArgs, cfg: &ConfigFile) -> SchedulerOptions {
    SchedulerOptions {
        max_parallel_jobs: args
            .max_parallel_jobs
            .map(|n| n as usize)
            .or(cfg.config.max_parallel_jobs),
        workspace_root: args
            .workspace_root
            .clone()
            .unwrap_or_else(|| cfg.config.effective_workspace_root()),
    }
}

/// Print jobs, stages and enabled tasks in dispatch order.
fn print_dry_run(cfg: &ConfigFile, options: &SchedulerOptions) {
    println!("pipewright dry-run");
    match options.max_parallel_jobs {
        Some(n) => println!("  max_parallel_jobs = {n}"),
        None => println!("  max_parallel_jobs = unbounded"),
    }
    println!("  workspace_root = {}", options.workspace_root.display());
    println!();

    match &cfg.batch {
        Batch::Jobs(jobs) => {
            println!("jobs ({}, in parallel):", jobs.len());
            for job in jobs {
                println!("  - {}", job.id);
                print_stages(&job.stages, "      ");
            }
        }
        Batch::Stages(stages) => {
            println!("stages ({}, sequential):", stages.len());
            print_stages(stages, "  ");
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_stages(stages: &[StageSpec], indent: &str) {
    for (i, stage) in stages.iter().enumerate() {
        let policy = if stage.ignore_failure {
            " (ignore_failure)"
        } else {
            ""
        };
        println!("{indent}{}. {}{policy}", i + 1, stage.name);

        let enabled: Vec<_> = stage
            .enabled_tasks()
            .map(|(kind, task)| match &task.timeout {
                Some(timeout) => format!("{kind} (timeout {timeout})"),
                None => kind.to_string(),
            })
            .collect();
        if enabled.is_empty() {
            println!("{indent}   tasks: none enabled");
        } else {
            println!("{indent}   tasks: {}", enabled.join(" -> "));
        }
    }
}
