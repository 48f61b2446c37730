// src/exec/tasks/scan.rs

//! Security and quality scanners: `trivy` and `sonarqube_analysis`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::engine::TaskOutcome;
use crate::exec::process::{CommandSpec, ProcessRunner};
use crate::exec::tasks::{Step, run_steps};
use crate::exec::{HandlerFuture, TaskContext, TaskHandler};

const ALL_SEVERITIES: &str = "UNKNOWN,LOW,MEDIUM,HIGH,CRITICAL";

pub struct TrivyHandler {
    runner: Arc<dyn ProcessRunner>,
}

impl TrivyHandler {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

impl TaskHandler for TrivyHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let settings = ctx.config.settings();
            let target_type = settings.str_or("target_type", "image")?;

            let target = match settings.str("target")? {
                Some(target) => target.to_string(),
                None if matches!(target_type, "fs" | "filesystem") => {
                    ctx.state.require_working_dir()?.to_string_lossy().into_owned()
                }
                None => match ctx.state.built_image() {
                    Some(image) => image.to_string(),
                    None => {
                        return Ok(TaskOutcome::failure(format!(
                            "no trivy target configured and no image was built for target type '{target_type}'"
                        )));
                    }
                },
            };

            info!(%target_type, %target, "running vulnerability scan");

            let spec = CommandSpec::new("trivy").args([
                target_type,
                target.as_str(),
                "--format",
                settings.str_or("format", "json")?,
                "--severity",
                settings.str_or("severity", ALL_SEVERITIES)?,
            ]);
            run_steps(
                self.runner.as_ref(),
                vec![Step::new(format!("trivy scan of '{target}'"), spec)],
            )
            .await
        })
    }
}

pub struct SonarQubeHandler {
    runner: Arc<dyn ProcessRunner>,
}

impl SonarQubeHandler {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

impl TaskHandler for SonarQubeHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let settings = ctx.config.settings();

            let (Some(server_url), Some(project_key), Some(token)) = (
                settings.str("server_url")?,
                settings.str("project_key")?,
                settings.str("token")?,
            ) else {
                return Ok(TaskOutcome::failure(
                    "sonarqube_analysis needs server_url, project_key and token",
                ));
            };

            let source_dir = match settings.str("source_dir")? {
                Some(dir) => PathBuf::from(dir),
                None => ctx.state.require_working_dir()?.to_path_buf(),
            };

            info!(%server_url, %project_key, "running code analysis");

            let spec = CommandSpec::new("sonar-scanner")
                .arg(format!("-Dsonar.projectKey={project_key}"))
                .arg(format!("-Dsonar.sources={}", source_dir.display()))
                .arg(format!("-Dsonar.host.url={server_url}"))
                .env("SONAR_TOKEN", token)
                .secret(token)
                .current_dir(&source_dir);

            run_steps(
                self.runner.as_ref(),
                vec![Step::new(format!("sonar-scanner for '{project_key}'"), spec)],
            )
            .await
        })
    }
}
