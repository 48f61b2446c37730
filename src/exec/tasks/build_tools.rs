// src/exec/tasks/build_tools.rs

//! Language build tools: `maven`, `gradle`, `ant`, `yarn`, `npm`, `go_build`.
//!
//! All of them run inside the job's working directory, so a clone task must
//! have run earlier in the job.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{info, warn};

use crate::config::Settings;
use crate::engine::TaskOutcome;
use crate::errors::Result;
use crate::exec::process::{CommandSpec, ProcessRunner};
use crate::exec::tasks::{Step, run_steps};
use crate::exec::{HandlerFuture, TaskContext, TaskHandler};

const DEFAULT_ARTIFACTS: [&str; 2] = ["*.jar", "*.war"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTool {
    Maven,
    Gradle,
    Ant,
    Yarn,
    Npm,
    Go,
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildTool::Maven => "maven",
            BuildTool::Gradle => "gradle",
            BuildTool::Ant => "ant",
            BuildTool::Yarn => "yarn",
            BuildTool::Npm => "npm",
            BuildTool::Go => "go",
        };
        f.write_str(name)
    }
}

pub struct BuildToolHandler {
    tool: BuildTool,
    runner: Arc<dyn ProcessRunner>,
}

impl BuildToolHandler {
    pub fn new(tool: BuildTool, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { tool, runner }
    }
}

impl TaskHandler for BuildToolHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let settings = ctx.config.settings();
            let dir = ctx.state.require_working_dir()?.to_path_buf();

            info!(tool = %self.tool, dir = %dir.display(), "running build");

            let steps = match self.tool {
                BuildTool::Maven => maven_steps(&settings, &dir)?,
                BuildTool::Gradle => gradle_steps(&settings, &dir).await?,
                BuildTool::Ant => ant_steps(&settings, &dir)?,
                BuildTool::Yarn => js_steps("yarn", ["build"], &dir),
                BuildTool::Npm => js_steps("npm", ["run", "build"], &dir),
                BuildTool::Go => go_steps(&settings, &dir).await?,
            };

            let outcome = run_steps(self.runner.as_ref(), steps).await?;
            if outcome != TaskOutcome::Success || self.tool != BuildTool::Maven {
                return Ok(outcome);
            }

            let output_dir = settings
                .str("output_dir")?
                .map(PathBuf::from)
                .unwrap_or_else(|| ctx.state.workspace().join("artifacts"));
            let patterns = settings
                .string_list("artifacts")?
                .unwrap_or_else(|| DEFAULT_ARTIFACTS.iter().map(|s| s.to_string()).collect());

            let moved = collect_artifacts(&dir.join("target"), &output_dir, &patterns).await?;
            info!(count = moved.len(), output = %output_dir.display(), "collected build artifacts");
            Ok(TaskOutcome::Success)
        })
    }
}

fn maven_steps(settings: &Settings<'_>, dir: &Path) -> Result<Vec<Step>> {
    let pom = settings.str_or("project_pom", "pom.xml")?;
    let mut spec = CommandSpec::new("mvn")
        .args(["-f", pom])
        .args(settings.words_or("goals", "clean install")?);
    if let Some(profiles) = settings.str("profiles")? {
        spec = spec.arg(format!("-P{profiles}"));
    }
    spec = spec.arg("--batch-mode").current_dir(dir);
    Ok(vec![Step::new("maven build", spec)])
}

async fn gradle_steps(settings: &Settings<'_>, dir: &Path) -> Result<Vec<Step>> {
    let wrapper = dir.join("gradlew");
    let program = if tokio::fs::try_exists(&wrapper).await.unwrap_or(false) {
        "./gradlew"
    } else {
        "gradle"
    };
    let spec = CommandSpec::new(program)
        .args(settings.words_or("target", "build")?)
        .arg("--no-daemon")
        .current_dir(dir);
    Ok(vec![Step::new("gradle build", spec)])
}

fn ant_steps(settings: &Settings<'_>, dir: &Path) -> Result<Vec<Step>> {
    let spec = CommandSpec::new("ant")
        .args(["-f", settings.str_or("build_file", "build.xml")?])
        .args(settings.words_or("target", "build")?)
        .current_dir(dir);
    Ok(vec![Step::new("ant build", spec)])
}

fn js_steps<const N: usize>(program: &str, build: [&str; N], dir: &Path) -> Vec<Step> {
    vec![
        Step::new(
            format!("{program} install"),
            CommandSpec::new(program).arg("install").current_dir(dir),
        ),
        Step::new(
            format!("{program} build"),
            CommandSpec::new(program).args(build).current_dir(dir),
        ),
    ]
}

async fn go_steps(settings: &Settings<'_>, dir: &Path) -> Result<Vec<Step>> {
    let mut steps = Vec::new();

    if !tokio::fs::try_exists(dir.join("go.mod")).await.unwrap_or(false) {
        let mut init = CommandSpec::new("go").args(["mod", "init"]);
        if let Some(module) = settings.str("module")? {
            init = init.arg(module);
        }
        steps.push(Step::new("go mod init", init.current_dir(dir)).optional());
    }

    steps.push(
        Step::new(
            "go get",
            CommandSpec::new("go").args(["get", "./..."]).current_dir(dir),
        )
        .optional(),
    );
    steps.push(Step::new(
        "go build",
        CommandSpec::new("go").args(["build", "-v"]).current_dir(dir),
    ));
    Ok(steps)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid artifact pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build().context("building artifact globset")?)
}

/// Move files directly under `source` whose name matches one of `patterns`
/// into `output_dir`. A missing `source` directory yields nothing.
async fn collect_artifacts(
    source: &Path,
    output_dir: &Path,
    patterns: &[String],
) -> Result<Vec<PathBuf>> {
    let matcher = build_globset(patterns)?;

    let mut entries = match tokio::fs::read_dir(source).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(dir = %source.display(), "no build output directory; nothing to collect");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut moved = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if !matcher.is_match(Path::new(&name)) {
            continue;
        }
        let dest = output_dir.join(&name);
        tokio::fs::rename(entry.path(), &dest)
            .await
            .with_context(|| format!("moving {} to {}", entry.path().display(), dest.display()))?;
        moved.push(dest);
    }
    moved.sort();
    Ok(moved)
}
