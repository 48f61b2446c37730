// src/exec/tasks/docker.rs

//! Container image build (`docker_build`) and registry push (`docker_hub`).

use std::sync::Arc;

use tracing::info;

use crate::engine::TaskOutcome;
use crate::exec::process::{CommandSpec, ProcessRunner};
use crate::exec::tasks::{Step, run_steps};
use crate::exec::{HandlerFuture, TaskContext, TaskHandler};

pub struct DockerBuildHandler {
    runner: Arc<dyn ProcessRunner>,
}

impl DockerBuildHandler {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

impl TaskHandler for DockerBuildHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let settings = ctx.config.settings();
            let context_dir = ctx.state.require_working_dir()?.to_path_buf();

            let dockerfile = match settings.str("dockerfile_path")? {
                Some(path) => context_dir.join(path),
                None => context_dir.join("Dockerfile"),
            };
            let image = format!(
                "{}:{}",
                settings.str_or("image_name", "docker_image")?,
                settings.str_or("build_tag", "latest")?
            );

            info!(%image, dockerfile = %dockerfile.display(), "building container image");

            let spec = CommandSpec::new("docker")
                .args(["build", "-t", image.as_str(), "-f"])
                .path_arg(&dockerfile)
                .path_arg(&context_dir);

            let outcome = run_steps(
                self.runner.as_ref(),
                vec![Step::new(format!("docker build of '{image}'"), spec)],
            )
            .await?;

            if outcome == TaskOutcome::Success {
                ctx.state.set_built_image(image);
            }
            Ok(outcome)
        })
    }
}

/// Tags the built image as `<username>/<repository>:<image_tag>` and pushes
/// it. A successful push counts as one upload.
pub struct DockerPushHandler {
    runner: Arc<dyn ProcessRunner>,
}

impl DockerPushHandler {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

impl TaskHandler for DockerPushHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let settings = ctx.config.settings();

            let built_image = match settings.str("built_image_name")? {
                Some(name) => name.to_string(),
                None => match ctx.state.built_image() {
                    Some(name) => name.to_string(),
                    None => {
                        return Ok(TaskOutcome::failure(
                            "built_image_name is missing and no docker_build ran earlier in this job",
                        ));
                    }
                },
            };

            let (Some(username), Some(password), Some(repository)) = (
                settings.str("username")?,
                settings.str("password")?,
                settings.str("repository")?,
            ) else {
                return Ok(TaskOutcome::failure(
                    "docker_hub needs username, password and repository",
                ));
            };

            let target = format!(
                "{username}/{repository}:{}",
                settings.str_or("image_tag", "latest")?
            );
            info!(source = %built_image, %target, "pushing image to registry");

            let steps = vec![
                Step::new(
                    "registry login",
                    CommandSpec::new("docker")
                        .args(["login", "-u", username, "--password-stdin"])
                        .stdin(format!("{password}\n"))
                        .secret(password),
                ),
                Step::new(
                    format!("tag '{built_image}' as '{target}'"),
                    CommandSpec::new("docker").args(["tag", built_image.as_str(), target.as_str()]),
                ),
                Step::new(
                    format!("push '{target}'"),
                    CommandSpec::new("docker").args(["push", target.as_str()]),
                ),
            ];

            let outcome = run_steps(self.runner.as_ref(), steps).await?;
            if outcome == TaskOutcome::Success {
                ctx.summary.record_upload();
            }
            Ok(outcome)
        })
    }
}
