// src/exec/tasks/mod.rs

//! Production task handlers.
//!
//! Each handler is a thin adapter that turns its settings into one or more
//! external commands:
//! - [`clone`]: `setup_and_clone` (git)
//! - [`docker`]: `docker_build`, `docker_hub`
//! - [`shell`]: `sh`, `bash`
//! - [`build_tools`]: `maven`, `gradle`, `ant`, `yarn`, `npm`, `go_build`
//! - [`scan`]: `trivy`, `sonarqube_analysis`
//! - [`notify`]: `send_notification` (SMTP through curl)
//! - [`approval`]: `request_approval`

use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::{HandlerRegistry, TaskOutcome};
use crate::errors::Result;
use crate::exec::process::{CommandSpec, ProcessRunner};
use crate::types::TaskKind;

pub mod approval;
pub mod build_tools;
pub mod clone;
pub mod docker;
pub mod notify;
pub mod scan;
pub mod shell;

pub use approval::{ApprovalHandler, ApprovalPolicy};
pub use build_tools::{BuildTool, BuildToolHandler};
pub use clone::CloneHandler;
pub use docker::{DockerBuildHandler, DockerPushHandler};
pub use notify::EmailNotificationHandler;
pub use scan::{SonarQubeHandler, TrivyHandler};
pub use shell::ShellStepsHandler;

/// Registry with a production handler for every task kind.
pub fn default_registry(
    runner: Arc<dyn ProcessRunner>,
    approval: ApprovalPolicy,
) -> HandlerRegistry {
    let build = |tool| Arc::new(BuildToolHandler::new(tool, Arc::clone(&runner)));

    HandlerRegistry::new()
        .with(TaskKind::SetupAndClone, Arc::new(CloneHandler::new(Arc::clone(&runner))))
        .with(TaskKind::DockerBuild, Arc::new(DockerBuildHandler::new(Arc::clone(&runner))))
        .with(TaskKind::DockerHub, Arc::new(DockerPushHandler::new(Arc::clone(&runner))))
        .with(TaskKind::Sh, Arc::new(ShellStepsHandler::sh(Arc::clone(&runner))))
        .with(TaskKind::Bash, Arc::new(ShellStepsHandler::bash(Arc::clone(&runner))))
        .with(TaskKind::Maven, build(BuildTool::Maven))
        .with(TaskKind::Gradle, build(BuildTool::Gradle))
        .with(TaskKind::Ant, build(BuildTool::Ant))
        .with(TaskKind::Yarn, build(BuildTool::Yarn))
        .with(TaskKind::Npm, build(BuildTool::Npm))
        .with(TaskKind::GoBuild, build(BuildTool::Go))
        .with(TaskKind::Trivy, Arc::new(TrivyHandler::new(Arc::clone(&runner))))
        .with(TaskKind::SonarqubeAnalysis, Arc::new(SonarQubeHandler::new(Arc::clone(&runner))))
        .with(TaskKind::SendNotification, Arc::new(EmailNotificationHandler::new(Arc::clone(&runner))))
        .with(TaskKind::RequestApproval, Arc::new(ApprovalHandler::new(approval)))
}

/// One command of a multi-command task.
#[derive(Debug, Clone)]
pub struct Step {
    pub label: String,
    pub spec: CommandSpec,
    /// A failing optional step is logged and the task carries on.
    pub optional: bool,
}

impl Step {
    pub fn new(label: impl Into<String>, spec: CommandSpec) -> Self {
        Self {
            label: label.into(),
            spec,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Run steps in order; the first failing required step fails the task.
pub async fn run_steps(runner: &dyn ProcessRunner, steps: Vec<Step>) -> Result<TaskOutcome> {
    let total = steps.len();
    for (i, step) in steps.into_iter().enumerate() {
        info!(step = i + 1, total, label = %step.label, "running step");
        let output = runner.run(step.spec).await?;

        if output.success {
            continue;
        }
        if step.optional {
            warn!(
                label = %step.label,
                error = %output.describe_failure(),
                "optional step failed; continuing"
            );
            continue;
        }
        return Ok(TaskOutcome::failure(format!(
            "{} failed ({})",
            step.label,
            output.describe_failure()
        )));
    }
    Ok(TaskOutcome::Success)
}
