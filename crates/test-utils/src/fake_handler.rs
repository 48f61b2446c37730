use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipewright::engine::{HandlerRegistry, TaskOutcome};
use pipewright::errors::PipewrightError;
use pipewright::exec::{HandlerFuture, TaskContext, TaskHandler};
use pipewright::types::TaskKind;

/// One recorded handler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub job: String,
    pub stage: String,
    pub kind: TaskKind,
}

impl Invocation {
    pub fn new(job: &str, stage: &str, kind: TaskKind) -> Self {
        Self {
            job: job.to_string(),
            stage: stage.to_string(),
            kind,
        }
    }
}

/// What a scripted call does.
#[derive(Debug, Clone)]
pub enum Action {
    Succeed,
    Fail(String),
    Skip(String),
    /// Return `Err` instead of an outcome.
    Error(String),
    Panic(String),
    /// Sleep, then succeed.
    Sleep(Duration),
}

#[derive(Debug, Clone)]
struct Rule {
    job: Option<String>,
    stage: Option<String>,
    kind: Option<TaskKind>,
    action: Action,
}

impl Rule {
    fn matches(&self, inv: &Invocation) -> bool {
        self.job.as_deref().is_none_or(|j| j == inv.job)
            && self.stage.as_deref().is_none_or(|s| s == inv.stage)
            && self.kind.is_none_or(|k| k == inv.kind)
    }
}

/// A handler that records every call and returns scripted outcomes.
///
/// Rules are checked in the order they were added; the first match wins and
/// calls no rule matches succeed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHandler {
    rules: Vec<Rule>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// `action` for every call of `kind`.
    pub fn on(self, kind: TaskKind, action: Action) -> Self {
        self.rule(None, None, Some(kind), action)
    }

    /// `action` for `kind` in one stage of one job.
    pub fn on_in(self, job: &str, stage: &str, kind: TaskKind, action: Action) -> Self {
        self.rule(Some(job), Some(stage), Some(kind), action)
    }

    /// `action` for every call in `job`.
    pub fn on_job(self, job: &str, action: Action) -> Self {
        self.rule(Some(job), None, None, action)
    }

    fn rule(
        mut self,
        job: Option<&str>,
        stage: Option<&str>,
        kind: Option<TaskKind>,
        action: Action,
    ) -> Self {
        self.rules.push(Rule {
            job: job.map(str::to_string),
            stage: stage.map(str::to_string),
            kind,
            action,
        });
        self
    }

    /// Shared view of the recorded calls; stays valid after the handler has
    /// been moved into a registry.
    pub fn calls(&self) -> Arc<Mutex<Vec<Invocation>>> {
        Arc::clone(&self.calls)
    }

    /// Registry with this handler behind every task kind.
    pub fn registry(&self) -> HandlerRegistry {
        let handler: Arc<dyn TaskHandler> = Arc::new(self.clone());
        TaskKind::CANONICAL_ORDER
            .into_iter()
            .fold(HandlerRegistry::new(), |reg, kind| {
                reg.with(kind, Arc::clone(&handler))
            })
    }

    fn action_for(&self, inv: &Invocation) -> Action {
        self.rules
            .iter()
            .find(|r| r.matches(inv))
            .map(|r| r.action.clone())
            .unwrap_or(Action::Succeed)
    }
}

impl TaskHandler for ScriptedHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        let inv = Invocation::new(&ctx.job.display_name(), ctx.stage, ctx.kind);
        let action = self.action_for(&inv);
        self.calls.lock().unwrap().push(inv);

        Box::pin(async move {
            match action {
                Action::Succeed => Ok(TaskOutcome::Success),
                Action::Fail(msg) => Ok(TaskOutcome::Failure(msg)),
                Action::Skip(reason) => Ok(TaskOutcome::Skipped(reason)),
                Action::Error(msg) => Err(PipewrightError::ConfigError(msg)),
                Action::Panic(msg) => panic!("{msg}"),
                Action::Sleep(d) => {
                    tokio::time::sleep(d).await;
                    Ok(TaskOutcome::Success)
                }
            }
        })
    }
}
