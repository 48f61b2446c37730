use std::sync::{Arc, Mutex};

use pipewright::errors::PipewrightError;
use pipewright::exec::{CommandOutput, CommandSpec, ProcessFuture, ProcessRunner};

/// A process runner that never spawns anything.
///
/// Every command is recorded. Commands whose (masked) command line contains a
/// configured fragment fail with the configured exit code; a fragment
/// registered via `missing_program` produces a spawn error instead.
#[derive(Debug, Clone, Default)]
pub struct RecordingProcessRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    failures: Vec<(String, CommandOutput)>,
    missing: Vec<String>,
}

impl RecordingProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when(mut self, fragment: &str, exit_code: i32, stderr: &[&str]) -> Self {
        self.failures
            .push((fragment.to_string(), CommandOutput::failed(exit_code, stderr)));
        self
    }

    pub fn missing_program(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded command lines, secrets masked.
    pub fn command_lines(&self) -> Vec<String> {
        self.specs().iter().map(CommandSpec::command_line).collect()
    }
}

impl ProcessRunner for RecordingProcessRunner {
    fn run(&self, spec: CommandSpec) -> ProcessFuture<'_> {
        let line = spec.command_line();
        self.calls.lock().unwrap().push(spec.clone());

        let result = if self.missing.contains(&spec.program) {
            Err(PipewrightError::Other(anyhow::anyhow!(
                "spawning `{}`: No such file or directory",
                spec.program
            )))
        } else {
            Ok(self
                .failures
                .iter()
                .find(|(fragment, _)| line.contains(fragment.as_str()))
                .map(|(_, output)| output.clone())
                .unwrap_or_else(CommandOutput::success))
        };

        Box::pin(async move { result })
    }
}
